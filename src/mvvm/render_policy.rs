//! Whether a view may currently accept a render call.

/// Describes conditions of a view with regard to whether it can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPolicy {
    /// The view can render.
    Possible,
    /// The view is unable to render.
    NotPossible(RenderError),
}

/// Why a view is unable to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// The view exists but is not attached or loaded yet.
    NotReady,
    /// The view has been dropped.
    Deallocated,
}

impl RenderPolicy {
    /// Convenience accessor describing if the view can be rendered.
    pub fn can_be_rendered(&self) -> bool {
        matches!(self, RenderPolicy::Possible)
    }

    /// `Possible` when `ready`, otherwise `NotPossible(NotReady)`.
    pub fn ready_if(ready: bool) -> Self {
        if ready {
            RenderPolicy::Possible
        } else {
            RenderPolicy::NotPossible(RenderError::NotReady)
        }
    }
}
