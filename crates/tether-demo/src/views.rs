#![forbid(unsafe_code)]

//! Headless views.
//!
//! Each view holds the model handles it reads from (resolved by whoever
//! builds it, never looked up) and renders a one-line text frame on every
//! `sync_view()`. Frames are kept so tests and the demo binary can inspect
//! exactly what a screen would have shown.

use std::sync::{Arc, Mutex, PoisonError};

use tether_adapters::RenderSurface;
use tether_lifecycle::SyncTarget;

use crate::counter::Counter;
use crate::playlist::Playlist;
use crate::wallet::Wallet;

/// Rendered frames, oldest first.
#[derive(Debug, Default)]
pub struct FrameLog {
    frames: Mutex<Vec<String>>,
}

impl FrameLog {
    fn push(&self, view: &'static str, frame: String) {
        tracing::debug!(view, %frame, "render");
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[derive(Debug)]
pub struct WalletView {
    wallet: Arc<Wallet>,
    frames: FrameLog,
}

impl WalletView {
    #[must_use]
    pub fn new(wallet: Arc<Wallet>) -> Self {
        Self {
            wallet,
            frames: FrameLog::default(),
        }
    }

    #[must_use]
    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }
}

impl SyncTarget for WalletView {
    fn sync_view(&self) {
        let state = self.wallet.state();
        let frame = format!(
            "mobile ${} | savings ${} | [+]{} [-]{}",
            state.mobile,
            state.savings(),
            if state.can_increase() { "" } else { " (off)" },
            if state.can_decrease() { "" } else { " (off)" },
        );
        self.frames.push("wallet", frame);
    }
}

#[derive(Debug)]
pub struct CounterView {
    counter: Arc<Counter>,
    frames: FrameLog,
}

impl CounterView {
    #[must_use]
    pub fn new(counter: Arc<Counter>) -> Self {
        Self {
            counter,
            frames: FrameLog::default(),
        }
    }

    #[must_use]
    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }
}

impl SyncTarget for CounterView {
    fn sync_view(&self) {
        let state = self.counter.state();
        let frame = if state.busy {
            format!("count {} (working...)", state.count)
        } else {
            format!("count {}", state.count)
        };
        self.frames.push("counter", frame);
    }
}

/// Summary line above the playlist rows.
#[derive(Debug)]
pub struct PlaylistHeader {
    playlist: Arc<Playlist>,
    frames: FrameLog,
}

impl PlaylistHeader {
    #[must_use]
    pub fn new(playlist: Arc<Playlist>) -> Self {
        Self {
            playlist,
            frames: FrameLog::default(),
        }
    }

    #[must_use]
    pub fn frames(&self) -> &FrameLog {
        &self.frames
    }
}

impl SyncTarget for PlaylistHeader {
    fn sync_view(&self) {
        let frame = if self.playlist.is_empty() {
            "playlist empty".to_string()
        } else {
            format!(
                "{} tracks | {} plays",
                self.playlist.len(),
                self.playlist.total_plays()
            )
        };
        self.frames.push("playlist", frame);
    }
}

/// Surface that reports every row operation as a log event.
#[derive(Debug, Default)]
pub struct LoggingSurface;

impl RenderSurface for LoggingSurface {
    fn notify_item_inserted(&self, position: usize) {
        tracing::info!(position, "row inserted");
    }

    fn notify_item_removed(&self, position: usize) {
        tracing::info!(position, "row removed");
    }

    fn notify_item_moved(&self, from: usize, to: usize) {
        tracing::info!(from, to, "row moved");
    }

    fn notify_item_changed(&self, position: usize) {
        tracing::info!(position, "row changed");
    }

    fn notify_all_changed(&self) {
        tracing::info!("all rows changed");
    }

    fn notify_item_range_inserted(&self, start: usize, count: usize) {
        tracing::info!(start, count, "rows inserted");
    }
}
