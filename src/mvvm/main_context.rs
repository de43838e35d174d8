//! The designated "main" execution context that all deliveries run on.
//!
//! A context is a single FIFO queue drained by exactly one thread. Work
//! dispatched from that thread runs inline; work dispatched from any other
//! thread is queued, so the relative order of queued jobs is preserved.
//!
//! A panic in a job on a spawned context aborts the process: once its thread
//! is gone every later delivery would be lost. On an attached context the
//! panic unwinds into whoever drives the [`MainLoop`].

use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::OnceLock;
use std::thread;

type Job = Box<dyn FnOnce() + Send>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static SHARED: OnceLock<MainContext> = OnceLock::new();

thread_local! {
    static CURRENT_CONTEXT: Cell<u64> = const { Cell::new(0) };
}

/// Handle used to schedule work onto a main execution context.
#[derive(Clone)]
pub struct MainContext {
    id: u64,
    sender: Sender<Job>,
}

impl MainContext {
    /// Run a new context on a dedicated thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                CURRENT_CONTEXT.with(|current| current.set(id));
                let main_loop = MainLoop::new(receiver);
                if panic::catch_unwind(AssertUnwindSafe(|| main_loop.run())).is_err() {
                    tracing::error!(
                        target: "stagehand",
                        context = id,
                        "Main context job panicked; aborting"
                    );
                    std::process::abort();
                }
            })?;
        Ok(Self { id, sender })
    }

    /// Designate the calling thread as a new context.
    ///
    /// The caller must drive the returned [`MainLoop`] from this thread,
    /// otherwise queued deliveries never run.
    pub fn attach() -> (Self, MainLoop) {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();
        CURRENT_CONTEXT.with(|current| current.set(id));
        (Self { id, sender }, MainLoop::new(receiver))
    }

    /// Process-wide default context, started on first use.
    ///
    /// # Panics
    /// Panics if the OS refuses to start the context thread.
    pub fn shared() -> &'static MainContext {
        SHARED.get_or_init(|| {
            MainContext::spawn("stagehand-main").expect("failed to start main context thread")
        })
    }

    /// Whether the calling thread drains this context.
    pub fn is_current(&self) -> bool {
        CURRENT_CONTEXT.with(|current| current.get()) == self.id
    }

    /// Run `job` inline when already on this context, otherwise queue it.
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_current() {
            job();
        } else if self.sender.send(Box::new(job)).is_err() {
            tracing::warn!(target: "stagehand", "Main context stopped; dropping delivery");
        }
    }

    /// Block until every job queued before this call has run.
    ///
    /// Returns `false` without waiting when called from the context itself
    /// or when the context has stopped.
    pub fn flush(&self) -> bool {
        if self.is_current() {
            return false;
        }
        let (done_tx, done_rx) = mpsc::channel();
        let barrier: Job = Box::new(move || {
            let _ = done_tx.send(());
        });
        if self.sender.send(barrier).is_err() {
            return false;
        }
        done_rx.recv().is_ok()
    }
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContext").field("id", &self.id).finish()
    }
}

/// Drains a context attached to the current thread.
///
/// Not `Send`: it must stay on the thread it was attached to.
pub struct MainLoop {
    receiver: Receiver<Job>,
    _thread_bound: PhantomData<*const ()>,
}

impl MainLoop {
    fn new(receiver: Receiver<Job>) -> Self {
        Self {
            receiver,
            _thread_bound: PhantomData,
        }
    }

    /// Run every job queued so far without blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs until every [`MainContext`] handle has been dropped.
    pub fn run(self) {
        while let Ok(job) = self.receiver.recv() {
            job();
        }
    }
}
