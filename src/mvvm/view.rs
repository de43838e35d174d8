//! Views that render view state, and the type-erased adapter a
//! [`ViewModel`](super::ViewModel) keeps for each of them.

use std::fmt;
use std::sync::{Arc, Weak};

use uuid::Uuid;

use crate::mvvm::render_policy::{RenderError, RenderPolicy};
use crate::mvvm::state::ViewState;
use crate::mvvm::store::short_type_name;

/// A view that renders state.
///
/// `render` should not be called directly. Register the view with a
/// [`ViewModel`](super::ViewModel) instead; it renders only when the state
/// actually changed and the view reports [`RenderPolicy::Possible`].
pub trait StatefulView: Send + Sync + 'static {
    type State: ViewState;

    /// Render the given state.
    fn render(&self, state: &Self::State);

    /// Whether the view can render right now.
    fn render_policy(&self) -> RenderPolicy;

    /// A detailed string used for logging purposes.
    fn log_description(&self) -> String {
        short_type_name::<Self>().to_string()
    }
}

/// Identifies one registration with a [`ViewModel`](super::ViewModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewToken(Uuid);

impl ViewToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ViewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Type-erased handle on a registered view.
pub trait AnyStatefulView<S>: Send + Sync {
    fn token(&self) -> ViewToken;

    fn render(&self, state: &S);

    fn render_policy(&self) -> RenderPolicy;

    fn log_description(&self) -> String;

    /// Whether this handle still wraps the live view allocated at `address`.
    fn wraps(&self, address: usize) -> bool;
}

/// Holds a view weakly so registration never keeps it alive.
pub(crate) struct WeakView<V> {
    token: ViewToken,
    address: usize,
    view: Weak<V>,
}

impl<V: StatefulView> WeakView<V> {
    pub(crate) fn new(view: &Arc<V>) -> Self {
        Self {
            token: ViewToken::generate(),
            address: view_address(view),
            view: Arc::downgrade(view),
        }
    }
}

/// Identity of a view: the address of its shared allocation.
pub(crate) fn view_address<V>(view: &Arc<V>) -> usize {
    Arc::as_ptr(view) as *const () as usize
}

impl<V: StatefulView> AnyStatefulView<V::State> for WeakView<V> {
    fn token(&self) -> ViewToken {
        self.token
    }

    fn render(&self, state: &V::State) {
        if let Some(view) = self.view.upgrade() {
            view.render(state);
        }
    }

    fn render_policy(&self) -> RenderPolicy {
        match self.view.upgrade() {
            Some(view) => view.render_policy(),
            None => RenderPolicy::NotPossible(RenderError::Deallocated),
        }
    }

    fn log_description(&self) -> String {
        match self.view.upgrade() {
            Some(view) => view.log_description(),
            None => "Deallocated view".to_string(),
        }
    }

    fn wraps(&self, address: usize) -> bool {
        self.address == address && self.view.strong_count() > 0
    }
}
