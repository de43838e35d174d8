//! Base traits for state in the MVVM layer.

use std::fmt::Debug;

/// Business-logic state owned by a [`Store`](super::Store).
///
/// States should be:
/// - Immutable once published (Clone to create new states)
/// - Comparable (PartialEq to detect changes)
/// - Describable for logging
pub trait DomainState: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// A detailed string used for logging purposes.
    fn log_description(&self) -> String {
        format!("{:?}", self)
    }
}

/// Presentation state owned by a [`ViewModel`](super::ViewModel), derived
/// from domain state.
pub trait ViewState: DomainState {}
