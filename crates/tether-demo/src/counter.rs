#![forbid(unsafe_code)]

//! A counter whose increments are computed as background work.
//!
//! `increase_by(n)` marks the counter busy and notifies, counts to `n` on the
//! dispatcher's background side, then adds the result, clears busy and
//! notifies again. Calls made while busy are ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tether_core::{Dispatcher, Observable, Result, Subject};

/// Immutable view of a [`Counter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterState {
    pub count: u64,
    pub busy: bool,
}

#[derive(Debug)]
struct Shared {
    subject: Subject,
    state: Mutex<CounterState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counter driven through a [`Dispatcher`].
#[derive(Debug)]
pub struct Counter {
    shared: Arc<Shared>,
    dispatcher: Dispatcher,
    tick: Duration,
}

impl Counter {
    /// `tick` is the simulated cost of each counting step.
    #[must_use]
    pub fn new(subject: Subject, dispatcher: Dispatcher, tick: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                subject,
                state: Mutex::new(CounterState::default()),
            }),
            dispatcher,
            tick,
        }
    }

    #[must_use]
    pub fn state(&self) -> CounterState {
        *self.shared.lock()
    }

    /// Count up by `n` in the background.
    ///
    /// Fails only if the background executor has shut down, in which case
    /// the counter is left idle.
    pub fn increase_by(&self, n: u32) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.busy {
                tracing::debug!(n, "counter busy; ignoring increase");
                return Ok(());
            }
            state.busy = true;
        }
        tracing::info!(n, mode = ?self.dispatcher.mode(), "counter increase started");
        self.shared.subject.notify();

        let tick = self.tick;
        let shared = Arc::clone(&self.shared);
        let submitted = self
            .dispatcher
            .run_background(move || count_to(n, tick), move |total| {
                {
                    let mut state = shared.lock();
                    state.count += total;
                    state.busy = false;
                }
                tracing::info!(total, "counter increase finished");
                shared.subject.notify();
            });

        if let Err(err) = submitted {
            tracing::error!(error = %err, "counter work was not scheduled");
            self.shared.lock().busy = false;
            self.shared.subject.notify();
            return Err(err);
        }
        Ok(())
    }
}

fn count_to(n: u32, tick: Duration) -> u64 {
    let mut total = 0;
    for _ in 0..n {
        if !tick.is_zero() {
            thread::sleep(tick);
        }
        total += 1;
        tracing::trace!(total, "tick");
    }
    total
}

impl Observable for Counter {
    fn subject(&self) -> &Subject {
        &self.shared.subject
    }
}
