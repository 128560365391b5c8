#![forbid(unsafe_code)]

//! Scripted walk through three screens.
//!
//! Each screen owns a [`SubscriptionManager`] and drives it with
//! start/stop events the way a UI host would. The same script runs in both
//! execution modes; only the waiting differs.

use std::sync::Arc;
use std::time::Duration;

use tether_adapters::{ChangeAwareAdapter, RenderSurface, RowAction};
use tether_core::{Observable, Result};
use tether_lifecycle::{LifecycleEvent, SubscriptionManager, SyncTarget};

use crate::counter::CounterState;
use crate::graph::ObjectGraph;
use crate::views::{CounterView, PlaylistHeader, WalletView};

/// Knobs for one run of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Script {
    pub tracks: usize,
    pub count: u32,
    /// Upper bound on waiting for background work to settle.
    pub settle_timeout: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            tracks: 5,
            count: 20,
            settle_timeout: Duration::from_secs(30),
        }
    }
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub wallet_frame: Option<String>,
    pub wallet_frames: usize,
    pub counter: CounterState,
    /// Counter frames rendered while the screen was started.
    pub counter_frames: usize,
    pub playlist_frames: usize,
    pub performed_actions: usize,
    pub dropped_actions: usize,
    pub final_tracks: usize,
}

fn screen(target: Arc<dyn SyncTarget>, model: &impl Observable) -> Result<SubscriptionManager> {
    SubscriptionManager::builder()
        .sync_target(target)
        .observe(model)
        .build()
}

/// Run the script against `graph`, sending playlist row ops to `surface`.
pub fn run(
    graph: &ObjectGraph,
    surface: Arc<dyn RenderSurface>,
    script: &Script,
) -> Result<SessionReport> {
    // ── Wallet ──────────────────────────────────────────────────────────
    let wallet = graph.wallet();
    let wallet_view = Arc::new(WalletView::new(Arc::clone(&wallet)));
    let mut wallet_screen = screen(wallet_view.clone(), &*wallet)?;
    wallet_screen.on_lifecycle(LifecycleEvent::Started);
    for _ in 0..3 {
        wallet.increase_mobile();
    }
    wallet.decrease_mobile();
    wallet_screen.on_lifecycle(LifecycleEvent::Stopped);
    // Not rendered: the screen is stopped.
    wallet.increase_mobile();
    tracing::info!(frame = ?wallet_view.frames().last(), "wallet screen done");

    // ── Counter ─────────────────────────────────────────────────────────
    let counter = graph.counter();
    let counter_view = Arc::new(CounterView::new(Arc::clone(&counter)));
    let mut counter_screen = screen(counter_view.clone(), &*counter)?;
    counter_screen.on_lifecycle(LifecycleEvent::Started);
    counter.increase_by(script.count)?;
    settle(graph, script, || !counter.state().busy);

    // Stop while work is in flight; the completion finds nobody listening.
    counter.increase_by(script.count)?;
    counter_screen.on_lifecycle(LifecycleEvent::Stopped);
    let counter_frames = counter_view.frames().count();
    settle(graph, script, || !counter.state().busy);
    tracing::info!(state = ?counter.state(), frames = counter_frames, "counter screen done");

    // ── Playlist ────────────────────────────────────────────────────────
    let playlist = graph.playlist();
    let header = Arc::new(PlaylistHeader::new(Arc::clone(&playlist)));
    let mut playlist_screen = screen(header.clone(), &*playlist)?;
    playlist_screen.on_lifecycle(LifecycleEvent::Started);
    let adapter = ChangeAwareAdapter::with_policy(
        Arc::clone(&playlist),
        surface,
        graph.config().diff_policy,
    );
    adapter.sync_now();

    playlist.add_tracks(script.tracks);

    let mut performed = 0;
    let mut dropped = 0;
    let mut tally = |outcome: RowAction<()>| match outcome {
        RowAction::Performed(()) => performed += 1,
        RowAction::Dropped => dropped += 1,
    };

    if let Some(handle) = adapter.row_handle(1) {
        let id = *handle.key();
        tally(adapter.perform(&handle, |_| playlist.increase_plays(id)));
        tally(adapter.perform(&handle, |_| playlist.increase_plays(id)));
    }
    if let Some(handle) = adapter.row_handle(0) {
        let id = *handle.key();
        // Row 0 disappears before the tap is handled.
        playlist.remove_first(1);
        tally(adapter.perform(&handle, |_| playlist.remove_track(id)));
    }
    if let Some(last) = playlist.len().checked_sub(1)
        && let Some(handle) = adapter.row_handle(last)
    {
        let id = *handle.key();
        tally(adapter.perform(&handle, |_| playlist.remove_track(id)));
    }
    playlist.remove_first(2);
    playlist.add_tracks(2);
    let final_tracks = playlist.len();
    playlist.remove_all();
    playlist_screen.on_lifecycle(LifecycleEvent::Stopped);
    drop(adapter);
    tracing::info!(performed, dropped, "playlist screen done");

    Ok(SessionReport {
        wallet_frame: wallet_view.frames().last(),
        wallet_frames: wallet_view.frames().count(),
        counter: counter.state(),
        counter_frames,
        playlist_frames: header.frames().count(),
        performed_actions: performed,
        dropped_actions: dropped,
        final_tracks,
    })
}

fn settle(graph: &ObjectGraph, script: &Script, done: impl FnMut() -> bool) {
    if !graph.ui_queue().run_until(script.settle_timeout, done) {
        tracing::warn!(timeout = ?script.settle_timeout, "background work did not settle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_adapters::RecordingSurface;

    #[test]
    fn synchronous_session_report() {
        let graph = ObjectGraph::for_tests();
        let surface = Arc::new(RecordingSurface::new());
        let report = run(&graph, surface.clone(), &Script::default()).unwrap();

        // activate + 3 increases + 1 decrease
        assert_eq!(report.wallet_frames, 5);
        assert_eq!(
            report.wallet_frame.as_deref(),
            Some("mobile $2 | savings $8 | [+] [-]")
        );
        assert_eq!(graph.wallet().state().mobile, 3);

        assert_eq!(report.counter, CounterState { count: 40, busy: false });
        assert_eq!(report.performed_actions, 3);
        assert_eq!(report.dropped_actions, 1);
        assert_eq!(report.final_tracks, 3);
        assert!(!surface.events().is_empty());
        assert!(!graph.playlist().has_listeners());
    }
}
