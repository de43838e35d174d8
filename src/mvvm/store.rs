//! Serialized domain-state container.
//!
//! A [`Store`] owns one current state. All changes go through [`Store::write`],
//! which queues the mutation on a single writer thread, so mutations never
//! interleave. Every published change is fanned out to live subscriptions on
//! the store's [`MainContext`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::contract::{self, ContractError, ViolationPolicy};
use crate::mvvm::main_context::MainContext;
use crate::mvvm::state::DomainState;
use crate::mvvm::subscription::{Subscription, SubscriptionInner};
use crate::stagehand_log;

type Mutation<S> = Box<dyn FnOnce(&mut S) + Send>;
type TransitionHook<S> = Box<dyn Fn(&Arc<S>, &Arc<S>) + Send + Sync>;

/// Identity of a store, stable across clones of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(Uuid);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

enum WriteJob<S> {
    Mutate(Mutation<S>),
    Barrier(Sender<()>),
}

/// The current state and how many assignments produced it.
struct Published<S> {
    version: u64,
    state: Arc<S>,
}

/// State shared with the writer thread and with queued deliveries.
struct Shared<S> {
    label: String,
    state: Mutex<Published<S>>,
    /// Weak references only; subscribers own their handles.
    subscriptions: Mutex<HashMap<Uuid, Weak<SubscriptionInner<S>>>>,
    /// Run on the writer thread for every assignment, changed or not.
    hooks: Mutex<Vec<TransitionHook<S>>>,
    context: MainContext,
}

struct Inner<S> {
    id: StoreId,
    shared: Arc<Shared<S>>,
    writer: Sender<WriteJob<S>>,
    /// Strongly retained subscriptions to other stores.
    other_store_subscriptions: Mutex<HashMap<StoreId, Box<dyn Any + Send + Sync>>>,
    policy: ViolationPolicy,
}

/// Thread-safe domain-state container with a single serialized writer.
///
/// Cloning the handle is cheap; clones share the same state, writer and
/// subscriptions. The writer thread exits once every handle is dropped.
pub struct Store<S: DomainState> {
    inner: Arc<Inner<S>>,
}

impl<S: DomainState> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Configures a [`Store`] before its writer starts.
pub struct StoreBuilder<S: DomainState> {
    initial_state: S,
    label: Option<String>,
    context: Option<MainContext>,
    policy: Option<ViolationPolicy>,
}

impl<S: DomainState> StoreBuilder<S> {
    /// Name used in log lines and for the writer thread.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Deliver on `context` instead of [`MainContext::shared`].
    pub fn context(mut self, context: MainContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Override the process-wide [`ViolationPolicy`] for this store.
    pub fn on_violation(mut self, policy: ViolationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Store<S> {
        let label = self
            .label
            .unwrap_or_else(|| format!("Store<{}>", short_type_name::<S>()));
        let context = self
            .context
            .unwrap_or_else(|| MainContext::shared().clone());
        let shared = Arc::new(Shared {
            label,
            state: Mutex::new(Published {
                version: 0,
                state: Arc::new(self.initial_state),
            }),
            subscriptions: Mutex::new(HashMap::new()),
            hooks: Mutex::new(Vec::new()),
            context,
        });

        let (writer, receiver) = mpsc::channel();
        let writer_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name(format!("{}.writer", shared.label))
            .spawn(move || writer_loop(receiver, writer_shared));
        if let Err(err) = spawned {
            tracing::error!(
                target: "stagehand",
                store = %shared.label,
                error = %err,
                "Failed to start store writer; writes will be dropped"
            );
        }

        Store {
            inner: Arc::new(Inner {
                id: StoreId(Uuid::new_v4()),
                shared,
                writer,
                other_store_subscriptions: Mutex::new(HashMap::new()),
                policy: self.policy.unwrap_or_else(contract::policy),
            }),
        }
    }
}

impl<S: DomainState> Store<S> {
    /// Create a store delivering on the shared main context.
    pub fn new(initial_state: S) -> Self {
        Self::builder(initial_state).build()
    }

    pub fn builder(initial_state: S) -> StoreBuilder<S> {
        StoreBuilder {
            initial_state,
            label: None,
            context: None,
            policy: None,
        }
    }

    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.shared.label
    }

    /// The latest published state. Never waits for pending writes.
    pub fn current_state(&self) -> Arc<S> {
        self.inner.shared.current()
    }

    /// A clone of the latest published state.
    pub fn state(&self) -> S {
        (*self.current_state()).clone()
    }

    /// Queue a state change.
    ///
    /// The mutation runs on the store's writer thread against a private copy
    /// of the current state; the result is then published as a whole. Writes
    /// run in submission order and never overlap. Returns immediately.
    pub fn write<F>(&self, mutation: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        if self
            .inner
            .writer
            .send(WriteJob::Mutate(Box::new(mutation)))
            .is_err()
        {
            tracing::warn!(
                target: "stagehand",
                store = %self.label(),
                "Store writer stopped; dropping write"
            );
        }
    }

    /// Queue a full replacement of the state.
    pub fn replace(&self, state: S) {
        self.write(move |current| *current = state);
    }

    /// Subscribe to state changes.
    ///
    /// `on_change` is called with the current state before this returns, then
    /// on the main context after each change. The store does not retain the
    /// returned handle: delivery stops when it is dropped.
    ///
    /// A change published while this call runs reaches `on_change` at most
    /// once, and never before an older state.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription<S>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let subscription = Subscription::new(on_change);
        {
            let mut subscriptions = self.inner.shared.subscriptions.lock();
            subscriptions.retain(|_, subscription| subscription.strong_count() > 0);
            subscriptions.insert(subscription.id(), subscription.downgrade());
        }
        let (version, state) = self.inner.shared.snapshot();
        subscription.fire(&state, version);
        subscription
    }

    /// Subscribe to another store, retaining the subscription here.
    ///
    /// # Errors
    /// [`ContractError::AlreadySubscribed`] if this store already follows
    /// `other`; the existing subscription is kept.
    pub fn subscribe_to<T, F>(&self, other: &Store<T>, on_change: F) -> Result<(), ContractError>
    where
        T: DomainState,
        F: Fn(&T) + Send + Sync + 'static,
    {
        if self.is_subscribed_to(other) {
            return Err(self.inner.policy.raise(ContractError::AlreadySubscribed {
                store: self.label().to_string(),
                other: other.label().to_string(),
            }));
        }

        let subscription = other.subscribe(on_change);
        self.inner
            .other_store_subscriptions
            .lock()
            .insert(other.id(), Box::new(subscription));
        Ok(())
    }

    /// Drop the retained subscription to `other`.
    ///
    /// # Errors
    /// [`ContractError::NotSubscribed`] if there is none.
    pub fn unsubscribe_from<T: DomainState>(&self, other: &Store<T>) -> Result<(), ContractError> {
        let removed = self
            .inner
            .other_store_subscriptions
            .lock()
            .remove(&other.id());
        match removed {
            Some(_) => Ok(()),
            None => Err(self.inner.policy.raise(ContractError::NotSubscribed {
                store: self.label().to_string(),
                other: other.label().to_string(),
            })),
        }
    }

    pub fn is_subscribed_to<T: DomainState>(&self, other: &Store<T>) -> bool {
        self.inner
            .other_store_subscriptions
            .lock()
            .contains_key(&other.id())
    }

    /// Number of subscriptions whose handles are still alive.
    pub fn live_subscriptions(&self) -> usize {
        let mut subscriptions = self.inner.shared.subscriptions.lock();
        subscriptions.retain(|_, subscription| subscription.strong_count() > 0);
        subscriptions.len()
    }

    /// Block until all writes submitted so far, and the deliveries they
    /// queued, have run.
    ///
    /// Called from the main context itself, this only waits for the writer;
    /// the queued deliveries run the next time that context is drained.
    pub fn flush(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.inner.writer.send(WriteJob::Barrier(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
        self.inner.shared.context.flush();
    }

    pub(crate) fn policy(&self) -> ViolationPolicy {
        self.inner.policy
    }

    pub(crate) fn context(&self) -> &MainContext {
        &self.inner.shared.context
    }

    /// Observe every assignment on the writer thread, including no-ops.
    pub(crate) fn on_transition<F>(&self, hook: F)
    where
        F: Fn(&Arc<S>, &Arc<S>) + Send + Sync + 'static,
    {
        self.inner.shared.hooks.lock().push(Box::new(hook));
    }
}

impl<S: DomainState> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("label", &self.inner.shared.label)
            .field("state", &self.current_state())
            .finish()
    }
}

impl<S: DomainState> Shared<S> {
    fn current(&self) -> Arc<S> {
        Arc::clone(&self.state.lock().state)
    }

    fn snapshot(&self) -> (u64, Arc<S>) {
        let published = self.state.lock();
        (published.version, Arc::clone(&published.state))
    }

    /// Publish `new_state` and notify subscribers if it differs from `old_state`.
    fn assign(self: &Arc<Self>, old_state: Arc<S>, new_state: S) {
        let new_state = Arc::new(new_state);
        let version = {
            let mut published = self.state.lock();
            published.version += 1;
            published.state = Arc::clone(&new_state);
            published.version
        };

        for hook in self.hooks.lock().iter() {
            hook(&old_state, &new_state);
        }

        if old_state == new_state {
            stagehand_log!(
                "[{}] State did not change: {}",
                self.label,
                old_state.log_description()
            );
            return;
        }

        stagehand_log!(
            "[{}] State change: {}",
            self.label,
            new_state.log_description()
        );

        let shared = Arc::clone(self);
        self.context
            .dispatch(move || shared.fire_all_subscriptions(&new_state, version));
    }

    fn fire_all_subscriptions(&self, state: &S, version: u64) {
        let live: Vec<Arc<SubscriptionInner<S>>> = {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions.retain(|_, subscription| subscription.strong_count() > 0);
            subscriptions.values().filter_map(Weak::upgrade).collect()
        };
        stagehand_log!("[{}] Notifying {} subscription(s)", self.label, live.len());
        for subscription in live {
            subscription.fire(state, version);
        }
    }
}

fn writer_loop<S: DomainState>(receiver: Receiver<WriteJob<S>>, shared: Arc<Shared<S>>) {
    while let Ok(job) = receiver.recv() {
        match job {
            WriteJob::Mutate(mutation) => {
                let old_state = shared.current();
                let mut new_state = (*old_state).clone();
                mutation(&mut new_state);
                shared.assign(old_state, new_state);
            }
            WriteJob::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
