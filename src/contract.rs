//! Developer contract violations and how they are handled.
//!
//! Misuse of the state core (double subscription, unknown tokens, rendering a
//! view that is not ready) is never an expected runtime condition. Whether it
//! halts the process or is reported and absorbed is a process-wide
//! [`ViolationPolicy`], overridable per store.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contract violations raised by [`Store`](crate::mvvm::Store) and
/// [`ViewModel`](crate::mvvm::ViewModel).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("[{store}] Trying to subscribe to an already subscribed store '{other}'")]
    AlreadySubscribed { store: String, other: String },

    #[error("[{store}] Trying to unsubscribe from a not subscribed store '{other}'")]
    NotSubscribed { store: String, other: String },

    #[error("[{view_model}] Trying to subscribe from an already subscribed view '{view}'")]
    ViewAlreadyRegistered { view_model: String, view: String },

    #[error("[{view_model}] Trying to unsubscribe a view that is not subscribed ({token})")]
    ViewNotRegistered { view_model: String, token: String },

    #[error("[{view}] Render error: view not ready to be rendered")]
    ViewNotReady { view: String },
}

/// What to do when a contract is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Halt immediately with the violation message.
    Panic,
    /// Log at error level and leave state untouched.
    Report,
}

impl ViolationPolicy {
    /// `Panic` in debug builds, `Report` otherwise.
    pub const fn build_default() -> Self {
        if cfg!(debug_assertions) {
            ViolationPolicy::Panic
        } else {
            ViolationPolicy::Report
        }
    }

    /// Apply this policy to a violation, returning it for propagation.
    ///
    /// # Panics
    /// Panics with the violation message under [`ViolationPolicy::Panic`].
    pub fn raise(self, error: ContractError) -> ContractError {
        match self {
            ViolationPolicy::Panic => panic!("{}", error),
            ViolationPolicy::Report => {
                tracing::error!(target: "stagehand", error = %error, "Contract violation");
                error
            }
        }
    }
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self::build_default()
    }
}

static POLICY: OnceLock<ViolationPolicy> = OnceLock::new();

/// Install the process-wide policy. Only the first call has any effect.
///
/// Returns `false` if a different policy was already installed.
pub fn set_policy(policy: ViolationPolicy) -> bool {
    *POLICY.get_or_init(|| policy) == policy
}

/// The process-wide policy used by stores built without an override.
pub fn policy() -> ViolationPolicy {
    POLICY.get().copied().unwrap_or_default()
}
