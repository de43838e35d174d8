//! Revocable store subscriptions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

type Callback<S> = Arc<dyn Fn(&S) + Send + Sync>;

pub(crate) struct SubscriptionInner<S> {
    id: Uuid,
    block: Mutex<Option<Callback<S>>>,
    /// One past the newest state version handed to `block`; 0 before any.
    delivered: AtomicU64,
}

impl<S> SubscriptionInner<S> {
    /// Deliver `state`, published as `version`, unless this subscription
    /// has already seen that version or a newer one.
    pub(crate) fn fire(&self, state: &S, version: u64) {
        if self.delivered.fetch_max(version + 1, Ordering::AcqRel) > version {
            return;
        }
        // Clone the callback out so it may call `stop()` on its own handle.
        let block = self.block.lock().clone();
        if let Some(block) = block {
            block(state);
        }
    }
}

/// Links a subscriber to a store through a callback.
///
/// The store only holds a weak reference to the subscription, so the
/// callback keeps firing for as long as this handle is alive. Dropping it
/// (or calling [`stop`](Self::stop)) ends delivery.
pub struct Subscription<S> {
    inner: Arc<SubscriptionInner<S>>,
}

impl<S> Subscription<S> {
    pub(crate) fn new<F>(block: F) -> Self
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SubscriptionInner {
                id: Uuid::new_v4(),
                block: Mutex::new(Some(Arc::new(block))),
                delivered: AtomicU64::new(0),
            }),
        }
    }

    /// Process-unique identity of this subscription.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Release the callback now, before the handle itself is dropped.
    pub fn stop(&self) {
        self.inner.block.lock().take();
    }

    /// Whether the callback is still installed.
    pub fn is_active(&self) -> bool {
        self.inner.block.lock().is_some()
    }

    pub(crate) fn fire(&self, state: &S, version: u64) {
        self.inner.fire(state, version);
    }

    pub(crate) fn downgrade(&self) -> Weak<SubscriptionInner<S>> {
        Arc::downgrade(&self.inner)
    }
}

impl<S> std::fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}
