//! Unidirectional state management and URL routing for client applications.
//!
//! - [`mvvm`]: serialized stores, weak subscriptions and view models that
//!   render into views only when their [`RenderPolicy`](mvvm::RenderPolicy)
//!   allows it.
//! - [`director`]: decomposes app URLs into scenes and query parameters and
//!   builds them back.

pub mod config;
pub mod contract;
pub mod director;
pub mod logging;
pub mod mvvm;
