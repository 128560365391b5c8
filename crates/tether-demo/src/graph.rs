#![forbid(unsafe_code)]

//! Explicit object graph: every model is built once, here, from a
//! [`RuntimeConfig`], and handed to views by constructor.
//!
//! Tests either use [`ObjectGraph::for_tests`] (synchronous, strict diffs) or
//! [`ObjectGraph::with_executor`] to substitute their own executor.

use std::sync::Arc;
use std::time::Duration;

use tether_core::{
    BackgroundExecutor, Dispatcher, ExecutionMode, RuntimeConfig, Subject, UiQueue, WorkerPool,
};

use crate::counter::Counter;
use crate::playlist::Playlist;
use crate::wallet::Wallet;

/// Default simulated cost of one counter step in asynchronous mode.
pub const DEFAULT_COUNTER_TICK: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct ObjectGraph {
    config: RuntimeConfig,
    ui: UiQueue,
    pool: Option<Arc<WorkerPool>>,
    dispatcher: Dispatcher,
    wallet: Arc<Wallet>,
    counter: Arc<Counter>,
    playlist: Arc<Playlist>,
}

impl ObjectGraph {
    /// Build the graph. In asynchronous mode this starts a [`WorkerPool`]
    /// with `config.worker_threads` threads.
    pub fn new(config: RuntimeConfig, counter_tick: Duration) -> std::io::Result<Self> {
        let pool = match config.execution_mode {
            ExecutionMode::Synchronous => None,
            ExecutionMode::Asynchronous => Some(Arc::new(WorkerPool::new(config.worker_threads)?)),
        };
        let executor = pool
            .clone()
            .map(|pool| pool as Arc<dyn BackgroundExecutor>);
        Ok(Self::assemble(config, executor, pool, counter_tick))
    }

    /// Synchronous graph with strict diff checking and no worker threads.
    #[must_use]
    pub fn for_tests() -> Self {
        Self::assemble(RuntimeConfig::for_tests(), None, None, Duration::ZERO)
    }

    /// Graph whose background work goes to `executor`.
    #[must_use]
    pub fn with_executor(
        config: RuntimeConfig,
        executor: Arc<dyn BackgroundExecutor>,
        counter_tick: Duration,
    ) -> Self {
        Self::assemble(config, Some(executor), None, counter_tick)
    }

    fn assemble(
        config: RuntimeConfig,
        executor: Option<Arc<dyn BackgroundExecutor>>,
        pool: Option<Arc<WorkerPool>>,
        counter_tick: Duration,
    ) -> Self {
        let ui = UiQueue::new();
        let dispatcher = match executor {
            Some(executor) => Dispatcher::new(config.execution_mode, executor, ui.poster()),
            None => Dispatcher::synchronous(),
        };
        let subject = |label| Subject::with_warn_threshold(label, config.listener_warn_threshold);

        let wallet = Arc::new(Wallet::new(subject("wallet")));
        let counter = Arc::new(Counter::new(
            subject("counter"),
            dispatcher.clone(),
            counter_tick,
        ));
        let playlist = Arc::new(Playlist::new(subject("playlist")));

        tracing::debug!(mode = ?dispatcher.mode(), "object graph assembled");
        Self {
            config,
            ui,
            pool,
            dispatcher,
            wallet,
            counter,
            playlist,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The UI thread's mailbox; pump it from the thread that owns the views.
    #[must_use]
    pub fn ui_queue(&self) -> &UiQueue {
        &self.ui
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn wallet(&self) -> Arc<Wallet> {
        Arc::clone(&self.wallet)
    }

    #[must_use]
    pub fn counter(&self) -> Arc<Counter> {
        Arc::clone(&self.counter)
    }

    #[must_use]
    pub fn playlist(&self) -> Arc<Playlist> {
        Arc::clone(&self.playlist)
    }

    /// Stop the worker pool, if any. Queued jobs still run.
    pub fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_is_synchronous() {
        let graph = ObjectGraph::for_tests();
        assert_eq!(graph.dispatcher().mode(), ExecutionMode::Synchronous);
        graph.counter().increase_by(3).unwrap();
        assert_eq!(graph.counter().state().count, 3);
    }

    #[test]
    fn accessors_share_instances() {
        let graph = ObjectGraph::for_tests();
        assert!(Arc::ptr_eq(&graph.wallet(), &graph.wallet()));
        assert!(Arc::ptr_eq(&graph.playlist(), &graph.playlist()));
    }

    #[test]
    fn asynchronous_graph_starts_pool() {
        let config = RuntimeConfig::for_tests()
            .with_execution_mode(ExecutionMode::Asynchronous)
            .with_worker_threads(1);
        let graph = ObjectGraph::new(config, Duration::ZERO).unwrap();
        assert_eq!(graph.dispatcher().mode(), ExecutionMode::Asynchronous);

        let counter = graph.counter();
        counter.increase_by(4).unwrap();
        let done = graph
            .ui_queue()
            .run_until(Duration::from_secs(5), || !counter.state().busy);
        assert!(done);
        assert_eq!(counter.state().count, 4);
        graph.shutdown();
    }
}
