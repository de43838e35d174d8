//! Shared test utilities: state types, recording views and store helpers.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use stagehand::contract::ViolationPolicy;
use stagehand::mvvm::{
    DomainState, MainContext, RenderError, RenderPolicy, StatefulView, Store, ViewModel,
    ViewState,
};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Simple domain state for store tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inbox {
    pub unread: u32,
    pub title: String,
}

impl DomainState for Inbox {}

impl Inbox {
    pub fn with_unread(unread: u32) -> Self {
        Self {
            unread,
            title: "Inbox".to_string(),
        }
    }
}

/// View state for view model tests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    pub items: Vec<String>,
}

impl DomainState for FeedState {
    fn log_description(&self) -> String {
        format!("FeedState({} items)", self.items.len())
    }
}

impl ViewState for FeedState {}

impl FeedState {
    pub fn with_items(items: &[&str]) -> Self {
        Self {
            items: items.iter().map(|item| item.to_string()).collect(),
        }
    }
}

const READY: u8 = 0;
const NOT_READY: u8 = 1;

/// A view that records every render and can be toggled not-ready.
pub struct RecordingView {
    pub name: String,
    readiness: AtomicU8,
    rendered: Mutex<Vec<FeedState>>,
}

impl RecordingView {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            readiness: AtomicU8::new(READY),
            rendered: Mutex::new(Vec::new()),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        let value = if ready { READY } else { NOT_READY };
        self.readiness.store(value, Ordering::SeqCst);
    }

    pub fn rendered(&self) -> Vec<FeedState> {
        self.rendered.lock().clone()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().len()
    }
}

impl StatefulView for RecordingView {
    type State = FeedState;

    fn render(&self, state: &FeedState) {
        self.rendered.lock().push(state.clone());
    }

    fn render_policy(&self) -> RenderPolicy {
        match self.readiness.load(Ordering::SeqCst) {
            READY => RenderPolicy::Possible,
            _ => RenderPolicy::NotPossible(RenderError::NotReady),
        }
    }

    fn log_description(&self) -> String {
        format!("RecordingView({})", self.name)
    }
}

/// A store with its own main context so tests never share delivery queues.
pub fn isolated_store<S: DomainState>(initial: S, policy: ViolationPolicy) -> Store<S> {
    Store::builder(initial)
        .label("TestStore")
        .context(MainContext::spawn("test-main").expect("spawn main context"))
        .on_violation(policy)
        .build()
}

pub fn isolated_view_model(policy: ViolationPolicy) -> ViewModel<FeedState> {
    ViewModel::from_store(isolated_store(FeedState::default(), policy))
}

/// Subscribe and collect every delivered state.
pub fn recorder<S: DomainState>() -> (Arc<Mutex<Vec<S>>>, impl Fn(&S) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |state: &S| sink.lock().push(state.clone()))
}

/// Set in the environment of a test re-run by [`run_in_child`].
const CHILD_ENV: &str = "STAGEHAND_TEST_CHILD";

/// Whether this test process was started by [`run_in_child`].
pub fn in_child() -> bool {
    std::env::var_os(CHILD_ENV).is_some()
}

/// Re-run one test of the current test binary in a separate process.
///
/// Used for behavior that ends the process, which would otherwise take the
/// whole test run down with it.
pub fn run_in_child(test_name: &str) -> ExitStatus {
    let binary = std::env::current_exe().expect("current test binary");
    Command::new(binary)
        .args([test_name, "--exact", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run child test")
}

/// Assert the child was killed by `abort()` rather than a failed assertion.
pub fn assert_aborted(status: ExitStatus) {
    assert!(!status.success(), "child exited normally: {}", status);
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(6), "expected SIGABRT, got {}", status);
    }
}
