#![forbid(unsafe_code)]

//! The positional notification sink a list adapter drives.

use std::sync::{Mutex, PoisonError};

/// A list rendering surface that accepts positional change notifications.
///
/// Calls arrive on the thread that fired the model's subject, which in
/// production is the UI thread.
pub trait RenderSurface: Send + Sync {
    fn notify_item_inserted(&self, position: usize);
    fn notify_item_removed(&self, position: usize);
    fn notify_item_moved(&self, from: usize, to: usize);
    fn notify_item_changed(&self, position: usize);
    /// Rebind everything; no animation.
    fn notify_all_changed(&self);

    /// `count` items appeared starting at `start`.
    fn notify_item_range_inserted(&self, start: usize, count: usize) {
        for offset in 0..count {
            self.notify_item_inserted(start + offset);
        }
    }
}

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Inserted(usize),
    RangeInserted { start: usize, count: usize },
    Removed(usize),
    Moved { from: usize, to: usize },
    Changed(usize),
    AllChanged,
}

/// Headless surface that records every notification in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SurfaceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply the recorded structural events to `rows`, pulling inserted rows
    /// from `source` by position. Returns `false` if an event was out of
    /// bounds or a full rebind was requested.
    pub fn apply_to<T: Clone>(&self, rows: &mut Vec<T>, source: &[T]) -> bool {
        for event in self.events() {
            let ok = match event {
                SurfaceEvent::Inserted(at) => insert_from(rows, source, at),
                SurfaceEvent::RangeInserted { start, count } => {
                    (start..start + count).all(|at| insert_from(rows, source, at))
                }
                SurfaceEvent::Removed(at) => {
                    if at < rows.len() {
                        rows.remove(at);
                        true
                    } else {
                        false
                    }
                }
                SurfaceEvent::Moved { from, to } => {
                    if from < rows.len() && to < rows.len() {
                        let row = rows.remove(from);
                        rows.insert(to, row);
                        true
                    } else {
                        false
                    }
                }
                SurfaceEvent::Changed(at) => {
                    if at < rows.len() && at < source.len() {
                        rows[at] = source[at].clone();
                        true
                    } else {
                        false
                    }
                }
                SurfaceEvent::AllChanged => false,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

fn insert_from<T: Clone>(rows: &mut Vec<T>, source: &[T], at: usize) -> bool {
    if at <= rows.len() && at < source.len() {
        rows.insert(at, source[at].clone());
        true
    } else {
        false
    }
}

impl RenderSurface for RecordingSurface {
    fn notify_item_inserted(&self, position: usize) {
        self.push(SurfaceEvent::Inserted(position));
    }

    fn notify_item_removed(&self, position: usize) {
        self.push(SurfaceEvent::Removed(position));
    }

    fn notify_item_moved(&self, from: usize, to: usize) {
        self.push(SurfaceEvent::Moved { from, to });
    }

    fn notify_item_changed(&self, position: usize) {
        self.push(SurfaceEvent::Changed(position));
    }

    fn notify_all_changed(&self) {
        self.push(SurfaceEvent::AllChanged);
    }

    fn notify_item_range_inserted(&self, start: usize, count: usize) {
        self.push(SurfaceEvent::RangeInserted { start, count });
    }
}
