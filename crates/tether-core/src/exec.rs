#![forbid(unsafe_code)]

//! Dual-mode execution of background work.
//!
//! Models are built with a [`Dispatcher`] whose [`ExecutionMode`] is fixed at
//! construction:
//!
//! - **Synchronous**: `run_background(work, on_complete)` runs both closures
//!   on the calling thread before returning. Tests assert post-conditions
//!   immediately, with no polling or sleeping.
//! - **Asynchronous**: `work` runs on a [`BackgroundExecutor`] (a
//!   [`WorkerPool`] by default) and `on_complete` is posted to the
//!   [`UiQueue`], so model mutation and notification happen on the thread
//!   that owns the UI.
//!
//! ```text
//!  caller ──run_background──▶ executor thread: work()
//!                                   │
//!                                   ▼ post(on_complete(result))
//!  UI thread ◀──run_pending()── UiQueue
//! ```
//!
//! There is no cancellation. Work that completes after the host has stopped
//! still runs its completion on the UI queue; the resulting notification
//! simply finds no listeners.

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Result, TetherError};

/// Default number of worker threads for [`WorkerPool`].
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Whether background work runs inline or off-thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Run everything on the calling thread, to completion.
    Synchronous,
    /// Run work on a worker, complete on the UI queue.
    Asynchronous,
}

impl ExecutionMode {
    /// Parse `sync`/`synchronous`/`async`/`asynchronous` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Some(Self::Synchronous),
            "async" | "asynchronous" => Some(Self::Asynchronous),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_synchronous(self) -> bool {
        matches!(self, Self::Synchronous)
    }
}

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Injected capability: run a job somewhere else, eventually.
pub trait BackgroundExecutor: Send + Sync {
    /// Queue `job` for execution. Returns [`TetherError::ExecutorShutdown`]
    /// if the executor no longer accepts work.
    fn submit(&self, job: Job) -> Result<()>;
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Fixed-size pool of named worker threads fed by one shared channel.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("running", &self.is_running())
            .finish()
    }
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one).
    pub fn new(threads: usize) -> std::io::Result<Self> {
        let threads = threads.max(1);
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(threads);
        for index in 0..threads {
            let rx = Arc::clone(&rx);
            let handle = thread::Builder::new()
                .name(format!("tether-worker-{index}"))
                .spawn(move || worker_loop(index, &rx))?;
            handles.push(handle);
        }
        tracing::debug!(threads, "worker pool started");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            threads,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Whether the pool still accepts work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop accepting work, let queued jobs finish, and join the workers.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
        let handles: Vec<_> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl BackgroundExecutor for WorkerPool {
    fn submit(&self, job: Job) -> Result<()> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| TetherError::ExecutorShutdown),
            None => Err(TetherError::ExecutorShutdown),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, rx: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let job = {
            let guard = rx.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.recv() {
                Ok(job) => job,
                Err(_) => break,
            }
        };
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
            tracing::error!(worker = index, "background job panicked");
        }
    }
    tracing::trace!(worker = index, "worker exiting");
}

// ---------------------------------------------------------------------------
// UiQueue
// ---------------------------------------------------------------------------

/// A task marshaled onto the UI-owning thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Mailbox drained by the thread that owns the UI.
///
/// `UiQueue` is deliberately not `Sync`: exactly one thread pumps it. Other
/// threads post through a [`UiPoster`].
pub struct UiQueue {
    sender: mpsc::Sender<UiTask>,
    receiver: mpsc::Receiver<UiTask>,
}

impl std::fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiQueue").finish_non_exhaustive()
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiQueue {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A clonable handle for posting from any thread.
    #[must_use]
    pub fn poster(&self) -> UiPoster {
        UiPoster {
            sender: self.sender.clone(),
        }
    }

    /// Run every task currently queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Pump tasks until `done()` holds or `timeout` elapses.
    ///
    /// Returns whether `done()` held before the deadline.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if let Ok(task) = self.receiver.recv_timeout(deadline - now) {
                task();
            }
        }
    }
}

/// Posting side of a [`UiQueue`].
#[derive(Clone)]
pub struct UiPoster {
    sender: mpsc::Sender<UiTask>,
}

impl std::fmt::Debug for UiPoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiPoster").finish_non_exhaustive()
    }
}

impl UiPoster {
    /// Queue `task` for the UI thread. Dropped silently if the queue is gone.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if self.sender.send(Box::new(task)).is_err() {
            tracing::debug!("ui queue closed; dropping task");
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Mode-aware entry point models use for background work.
#[derive(Clone)]
pub struct Dispatcher {
    mode: ExecutionMode,
    executor: Option<Arc<dyn BackgroundExecutor>>,
    ui: Option<UiPoster>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher that runs everything inline.
    #[must_use]
    pub fn synchronous() -> Self {
        Self {
            mode: ExecutionMode::Synchronous,
            executor: None,
            ui: None,
        }
    }

    /// Dispatcher that runs work on `executor` and completes on `ui`.
    #[must_use]
    pub fn asynchronous(executor: Arc<dyn BackgroundExecutor>, ui: UiPoster) -> Self {
        Self {
            mode: ExecutionMode::Asynchronous,
            executor: Some(executor),
            ui: Some(ui),
        }
    }

    /// Build a dispatcher for `mode`; the collaborators are only used in
    /// asynchronous mode.
    #[must_use]
    pub fn new(mode: ExecutionMode, executor: Arc<dyn BackgroundExecutor>, ui: UiPoster) -> Self {
        match mode {
            ExecutionMode::Synchronous => Self::synchronous(),
            ExecutionMode::Asynchronous => Self::asynchronous(executor, ui),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run `work` as background work, then `on_complete(result)` on the UI
    /// thread.
    ///
    /// In synchronous mode both have finished when this returns.
    pub fn run_background<T, W, C>(&self, work: W, on_complete: C) -> Result<()>
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        match (&self.executor, &self.ui) {
            (Some(executor), Some(ui)) if !self.mode.is_synchronous() => {
                let ui = ui.clone();
                executor.submit(Box::new(move || {
                    let result = work();
                    ui.post(move || on_complete(result));
                }))
            }
            _ => {
                on_complete(work());
                Ok(())
            }
        }
    }

    /// Run `task` on the UI thread: inline when synchronous, posted otherwise.
    pub fn run_on_ui(&self, task: impl FnOnce() + Send + 'static) {
        match &self.ui {
            Some(ui) if !self.mode.is_synchronous() => ui.post(task),
            _ => task(),
        }
    }
}
