//! Store specialization that renders view state into registered views.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::{ContractError, ViolationPolicy};
use crate::mvvm::render_policy::{RenderError, RenderPolicy};
use crate::mvvm::state::ViewState;
use crate::mvvm::store::{short_type_name, Store};
use crate::mvvm::view::{view_address, AnyStatefulView, StatefulView, ViewToken, WeakView};
use crate::stagehand_log;

type ViewHandle<S> = Arc<dyn AnyStatefulView<S>>;

/// Holds the set of views subscribed to a view model.
struct ViewRegistry<S> {
    label: String,
    policy: ViolationPolicy,
    views: Mutex<Vec<ViewHandle<S>>>,
}

/// A [`Store`] of view state that also renders into registered views.
///
/// All of the store API is available through `Deref`. Views are held weakly
/// and rendered on the store's main context whenever their
/// [`RenderPolicy`] allows it.
pub struct ViewModel<S: ViewState> {
    store: Store<S>,
    registry: Arc<ViewRegistry<S>>,
}

impl<S: ViewState> Clone for ViewModel<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: ViewState> ViewModel<S> {
    /// Create a view model delivering on the shared main context.
    pub fn new(initial_state: S) -> Self {
        Self::from_store(
            Store::builder(initial_state)
                .label(format!("ViewModel<{}>", short_type_name::<S>()))
                .build(),
        )
    }

    /// Wrap an existing store, rendering its changes into views.
    pub fn from_store(store: Store<S>) -> Self {
        let registry: Arc<ViewRegistry<S>> = Arc::new(ViewRegistry {
            label: store.label().to_string(),
            policy: store.policy(),
            views: Mutex::new(Vec::new()),
        });

        let weak_registry = Arc::downgrade(&registry);
        let context = store.context().clone();
        store.on_transition(move |old_state, new_state| {
            let Some(registry) = weak_registry.upgrade() else {
                return;
            };
            let (old_state, new_state) = (Arc::clone(old_state), Arc::clone(new_state));
            context.dispatch(move || registry.state_did_change(&*old_state, &*new_state));
        });

        Self { store, registry }
    }

    /// Subscribe a view to view state changes.
    ///
    /// The view immediately gets a render attempt with the current state,
    /// regardless of whether that state is new. Returns a token usable with
    /// [`unregister`](Self::unregister); dropping the view is enough to end
    /// delivery otherwise.
    ///
    /// # Errors
    /// [`ContractError::ViewAlreadyRegistered`] if this view is already
    /// subscribed.
    pub fn register<V>(&self, view: &Arc<V>) -> Result<ViewToken, ContractError>
    where
        V: StatefulView<State = S>,
    {
        let address = view_address(view);
        let handle: ViewHandle<S> = Arc::new(WeakView::new(view));
        let token = handle.token();

        let duplicate = {
            let mut views = self.registry.views.lock();
            let duplicate = views.iter().any(|existing| existing.wraps(address));
            if !duplicate {
                views.push(Arc::clone(&handle));
            }
            duplicate
        };
        if duplicate {
            return Err(self
                .registry
                .policy
                .raise(ContractError::ViewAlreadyRegistered {
                    view_model: self.registry.label.clone(),
                    view: view.log_description(),
                }));
        }

        let registry = Arc::clone(&self.registry);
        let state = self.store.current_state();
        self.store.context().dispatch(move || {
            if registry.contains(token) {
                registry.deliver(&handle, &state, &state, true);
            }
        });
        Ok(token)
    }

    /// Unsubscribe the view registered under `token`.
    ///
    /// # Errors
    /// [`ContractError::ViewNotRegistered`] if no such registration exists.
    pub fn unregister(&self, token: ViewToken) -> Result<(), ContractError> {
        if self.registry.remove(token) {
            return Ok(());
        }
        Err(self.registry.policy.raise(ContractError::ViewNotRegistered {
            view_model: self.registry.label.clone(),
            token: token.to_string(),
        }))
    }

    pub fn is_registered(&self, token: ViewToken) -> bool {
        self.registry.contains(token)
    }

    /// Number of registrations, including views not yet found deallocated.
    pub fn registered_views(&self) -> usize {
        self.registry.views.lock().len()
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }
}

impl<S: ViewState> Deref for ViewModel<S> {
    type Target = Store<S>;

    fn deref(&self) -> &Store<S> {
        &self.store
    }
}

impl<S: ViewState> ViewRegistry<S> {
    fn contains(&self, token: ViewToken) -> bool {
        self.views.lock().iter().any(|view| view.token() == token)
    }

    fn remove(&self, token: ViewToken) -> bool {
        let mut views = self.views.lock();
        let before = views.len();
        views.retain(|view| view.token() != token);
        views.len() != before
    }

    /// Runs on the main context for every assignment.
    fn state_did_change(&self, old_state: &S, new_state: &S) {
        let views: Vec<ViewHandle<S>> = self.views.lock().clone();
        for view in &views {
            self.deliver(view, old_state, new_state, false);
        }
    }

    /// Render into one view depending on its render policy.
    ///
    /// `force` renders even if the state has not changed.
    fn deliver(&self, view: &ViewHandle<S>, old_state: &S, new_state: &S, force: bool) {
        match view.render_policy() {
            RenderPolicy::Possible => self.handle_possible_render(view, old_state, new_state, force),
            RenderPolicy::NotPossible(error) => self.handle_not_possible_render(view, error),
        }
    }

    fn handle_possible_render(
        &self,
        view: &ViewHandle<S>,
        old_state: &S,
        new_state: &S,
        force: bool,
    ) {
        if !force && new_state == old_state {
            stagehand_log!(
                "[{}] Skip rendering with the same state: {}",
                view.log_description(),
                new_state.log_description()
            );
            return;
        }

        stagehand_log!(
            "[{}] Render with state: {}",
            view.log_description(),
            new_state.log_description()
        );
        view.render(new_state);
    }

    fn handle_not_possible_render(&self, view: &ViewHandle<S>, error: RenderError) {
        match error {
            RenderError::NotReady => {
                // Under `Report` the view stays registered and is retried on
                // the next change.
                let _ = self.policy.raise(ContractError::ViewNotReady {
                    view: view.log_description(),
                });
            }
            RenderError::Deallocated => {
                stagehand_log!(
                    "[{}] Render error: view deallocated",
                    view.log_description()
                );
                self.remove(view.token());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvvm::main_context::MainContext;
    use crate::mvvm::state::DomainState;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Badge {
        count: u32,
    }

    impl DomainState for Badge {}
    impl ViewState for Badge {}

    #[derive(Default)]
    struct BadgeView {
        rendered: Mutex<Vec<u32>>,
    }

    impl StatefulView for BadgeView {
        type State = Badge;

        fn render(&self, state: &Badge) {
            self.rendered.lock().push(state.count);
        }

        fn render_policy(&self) -> RenderPolicy {
            RenderPolicy::Possible
        }
    }

    fn view_model(policy: ViolationPolicy) -> ViewModel<Badge> {
        ViewModel::from_store(
            Store::builder(Badge::default())
                .label("BadgeViewModel")
                .context(MainContext::spawn("view-model-test-main").unwrap())
                .on_violation(policy)
                .build(),
        )
    }

    #[test]
    fn registration_forces_initial_render() {
        let view_model = view_model(ViolationPolicy::Panic);
        let view = Arc::new(BadgeView::default());
        view_model.register(&view).unwrap();
        view_model.flush();
        assert_eq!(*view.rendered.lock(), vec![0]);
    }

    #[test]
    fn unchanged_state_is_not_rendered_again() {
        let view_model = view_model(ViolationPolicy::Panic);
        let view = Arc::new(BadgeView::default());
        view_model.register(&view).unwrap();
        view_model.replace(Badge::default());
        view_model.replace(Badge { count: 2 });
        view_model.flush();
        assert_eq!(*view.rendered.lock(), vec![0, 2]);
    }

    #[test]
    fn duplicate_registration_is_reported() {
        let view_model = view_model(ViolationPolicy::Report);
        let view = Arc::new(BadgeView::default());
        view_model.register(&view).unwrap();
        let second = view_model.register(&view);
        assert!(matches!(
            second,
            Err(ContractError::ViewAlreadyRegistered { .. })
        ));
        assert_eq!(view_model.registered_views(), 1);
    }

    #[test]
    fn unregister_unknown_token_is_reported() {
        let view_model = view_model(ViolationPolicy::Report);
        let view = Arc::new(BadgeView::default());
        let token = view_model.register(&view).unwrap();
        view_model.unregister(token).unwrap();
        assert!(matches!(
            view_model.unregister(token),
            Err(ContractError::ViewNotRegistered { .. })
        ));
    }

    #[test]
    fn unregistered_view_gets_no_more_renders() {
        let view_model = view_model(ViolationPolicy::Panic);
        let view = Arc::new(BadgeView::default());
        let token = view_model.register(&view).unwrap();
        view_model.flush();
        view_model.unregister(token).unwrap();
        view_model.replace(Badge { count: 5 });
        view_model.flush();
        assert_eq!(*view.rendered.lock(), vec![0]);
    }
}
