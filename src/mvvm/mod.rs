//! Model-View-ViewModel state primitives.
//!
//! This module provides unidirectional data flow between domain logic and
//! presentation.
//!
//! # Architecture
//!
//! ```text
//! write ──→ Store (single writer) ──→ Subscription ──→ subscriber
//!                 │
//!                 └──→ ViewModel ──→ RenderPolicy ──→ StatefulView::render
//! ```
//!
//! - **Store**: owns the current state and serializes every mutation
//! - **Subscription**: weakly held callback, alive while its owner keeps it
//! - **ViewModel**: store of view state that renders into registered views
//! - **MainContext**: the single context all deliveries run on

mod main_context;
mod render_policy;
mod state;
mod store;
mod subscription;
mod view;
mod view_model;

pub use main_context::{MainContext, MainLoop};
pub use render_policy::{RenderError, RenderPolicy};
pub use state::{DomainState, ViewState};
pub use store::{Store, StoreBuilder, StoreId};
pub use subscription::Subscription;
pub use view::{AnyStatefulView, StatefulView, ViewToken};
pub use view_model::ViewModel;
