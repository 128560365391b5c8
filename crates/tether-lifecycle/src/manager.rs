#![forbid(unsafe_code)]

//! [`SubscriptionManager`]: couples a fixed bundle of subjects to one view.
//!
//! # State Machine
//!
//! ```text
//!            activate()                 deactivate()
//! INACTIVE ─────────────▶ ACTIVE ─────────────────▶ INACTIVE
//!   │  add aggregator to every subject    remove aggregator from every subject
//!   └─ then sync_view() once
//! ```
//!
//! # Invariants
//!
//! 1. While ACTIVE, the aggregator listener is registered exactly once on
//!    every subject in the bundle; while INACTIVE, on none of them.
//! 2. `activate()` calls `sync_view()` exactly once, after registration and
//!    before any notification-driven call.
//! 3. Each subject fire produces exactly one `sync_view()` call. Fires are
//!    not coalesced, even when several subjects fire back to back.
//! 4. The bundle is fixed at construction. Observing a different set means
//!    building a new manager.
//! 5. Dropping an ACTIVE manager deactivates it.

use std::sync::Arc;

use tether_core::{ListenerRef, Observable, Result, Subject, TetherError, listener_fn};

/// View-side capability: re-render from current model state.
///
/// Implementations must be idempotent and must render a placeholder rather
/// than panic when there is no data yet.
pub trait SyncTarget: Send + Sync {
    fn sync_view(&self);
}

impl<F> SyncTarget for F
where
    F: Fn() + Send + Sync,
{
    fn sync_view(&self) {
        self()
    }
}

/// Where a manager is in its host's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Inactive,
    Active,
}

/// Host callbacks a manager understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host became visible/interactive.
    Started,
    /// The host stopped being visible/interactive.
    Stopped,
}

/// Keeps a [`SyncTarget`] subscribed to a bundle of subjects while active.
pub struct SubscriptionManager {
    target: Arc<dyn SyncTarget>,
    subjects: Box<[Subject]>,
    aggregator: ListenerRef,
    state: LifecycleState,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("subjects", &self.subjects.len())
            .field("state", &self.state)
            .finish()
    }
}

impl SubscriptionManager {
    /// Start building a manager.
    #[must_use]
    pub fn builder() -> SubscriptionManagerBuilder {
        SubscriptionManagerBuilder::default()
    }

    /// Build a manager directly from a target and a subject bundle.
    ///
    /// Fails with [`TetherError::InvalidArgument`] if `subjects` is empty.
    pub fn new(target: Arc<dyn SyncTarget>, subjects: Vec<Subject>) -> Result<Self> {
        let mut unique: Vec<Subject> = Vec::with_capacity(subjects.len());
        for subject in subjects {
            if !unique.iter().any(|s| s.same_subject(&subject)) {
                unique.push(subject);
            }
        }
        if unique.is_empty() {
            return Err(TetherError::InvalidArgument("subject bundle is empty"));
        }

        let for_listener = Arc::clone(&target);
        let aggregator = listener_fn(move || {
            tracing::trace!("subject fired; syncing view");
            for_listener.sync_view();
        });

        Ok(Self {
            target,
            subjects: unique.into_boxed_slice(),
            aggregator,
            state: LifecycleState::Inactive,
        })
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Subjects in the bundle, in construction order (duplicates removed).
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Register on every subject, then sync the view once.
    ///
    /// A second call without an intervening [`deactivate`](Self::deactivate)
    /// is ignored.
    pub fn activate(&mut self) {
        if self.is_active() {
            tracing::warn!("activate() on an already active subscription manager; ignoring");
            return;
        }
        for subject in self.subjects.iter() {
            subject.add_listener(&self.aggregator);
        }
        self.state = LifecycleState::Active;
        tracing::debug!(subjects = self.subjects.len(), "subscriptions activated");
        self.target.sync_view();
    }

    /// Unregister from every subject. No-op when inactive.
    pub fn deactivate(&mut self) {
        if !self.is_active() {
            return;
        }
        for subject in self.subjects.iter() {
            subject.remove_listener(&self.aggregator);
        }
        self.state = LifecycleState::Inactive;
        tracing::debug!(subjects = self.subjects.len(), "subscriptions deactivated");
    }

    /// Forward a host lifecycle callback.
    pub fn on_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Started => self.activate(),
            LifecycleEvent::Stopped => self.deactivate(),
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::debug!("subscription manager dropped while active");
            self.deactivate();
        }
    }
}

/// Builder for [`SubscriptionManager`].
#[derive(Default)]
pub struct SubscriptionManagerBuilder {
    target: Option<Arc<dyn SyncTarget>>,
    subjects: Vec<Subject>,
}

impl std::fmt::Debug for SubscriptionManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManagerBuilder")
            .field("has_target", &self.target.is_some())
            .field("subjects", &self.subjects.len())
            .finish()
    }
}

impl SubscriptionManagerBuilder {
    /// The view to re-sync.
    #[must_use]
    pub fn sync_target(mut self, target: Arc<dyn SyncTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Add a model (or bare subject) to the bundle.
    #[must_use]
    pub fn observe(mut self, observable: &(impl Observable + ?Sized)) -> Self {
        self.subjects.push(observable.subject().clone());
        self
    }

    /// Add several subjects to the bundle.
    #[must_use]
    pub fn observe_all(mut self, subjects: impl IntoIterator<Item = Subject>) -> Self {
        self.subjects.extend(subjects);
        self
    }

    /// Fails with [`TetherError::InvalidArgument`] when the sync target is
    /// missing or no subject was given.
    pub fn build(self) -> Result<SubscriptionManager> {
        let target = self
            .target
            .ok_or(TetherError::InvalidArgument("sync target is required"))?;
        SubscriptionManager::new(target, self.subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_target() -> (Arc<dyn SyncTarget>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let target: Arc<dyn SyncTarget> = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (target, count)
    }

    #[test]
    fn build_without_target_fails() {
        let subject = Subject::new("s");
        let err = SubscriptionManager::builder()
            .observe(&subject)
            .build()
            .unwrap_err();
        assert!(matches!(err, TetherError::InvalidArgument(_)));
    }

    #[test]
    fn build_without_subjects_fails() {
        let (target, _) = counting_target();
        let err = SubscriptionManager::builder()
            .sync_target(target)
            .build()
            .unwrap_err();
        assert_eq!(err, TetherError::InvalidArgument("subject bundle is empty"));
    }

    #[test]
    fn activate_syncs_once_without_any_fire() {
        let subject = Subject::new("s");
        let (target, count) = counting_target();
        let mut manager = SubscriptionManager::builder()
            .sync_target(target)
            .observe(&subject)
            .build()
            .unwrap();
        assert_eq!(manager.state(), LifecycleState::Inactive);
        manager.activate();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state(), LifecycleState::Active);
        assert_eq!(subject.listener_count(), 1);
    }

    #[test]
    fn double_activate_does_not_double_register() {
        let subject = Subject::new("s");
        let (target, count) = counting_target();
        let mut manager = SubscriptionManager::new(target, vec![subject.clone()]).unwrap();
        manager.activate();
        manager.activate();
        assert_eq!(subject.listener_count(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        subject.notify();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deactivate_detaches() {
        let subject = Subject::new("s");
        let (target, count) = counting_target();
        let mut manager = SubscriptionManager::new(target, vec![subject.clone()]).unwrap();
        manager.activate();
        manager.deactivate();
        assert!(!subject.has_listeners());

        subject.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        manager.activate();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        subject.notify();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn deactivate_when_inactive_is_noop() {
        let subject = Subject::new("s");
        let (target, _) = counting_target();
        let mut manager = SubscriptionManager::new(target, vec![subject]).unwrap();
        manager.deactivate();
        assert_eq!(manager.state(), LifecycleState::Inactive);
    }

    #[test]
    fn two_subjects_fired_back_to_back_sync_twice() {
        let s1 = Subject::new("s1");
        let s2 = Subject::new("s2");
        let (target, count) = counting_target();
        let mut manager = SubscriptionManager::builder()
            .sync_target(target)
            .observe(&s1)
            .observe(&s2)
            .build()
            .unwrap();
        manager.activate();
        count.store(0, Ordering::SeqCst);

        s1.notify();
        s2.notify();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_subjects_collapse() {
        let s = Subject::new("s");
        let (target, count) = counting_target();
        let mut manager =
            SubscriptionManager::new(target, vec![s.clone(), s.clone(), s.clone()]).unwrap();
        assert_eq!(manager.subjects().len(), 1);
        manager.activate();
        s.notify();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lifecycle_events_drive_transitions() {
        let s = Subject::new("s");
        let (target, count) = counting_target();
        let mut manager = SubscriptionManager::new(target, vec![s.clone()]).unwrap();
        manager.on_lifecycle(LifecycleEvent::Started);
        assert!(manager.is_active());
        manager.on_lifecycle(LifecycleEvent::Stopped);
        assert!(!manager.is_active());
        s.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_while_active_detaches() {
        let s = Subject::new("s");
        let (target, _) = counting_target();
        {
            let mut manager = SubscriptionManager::new(target, vec![s.clone()]).unwrap();
            manager.activate();
            assert!(s.has_listeners());
        }
        assert!(!s.has_listeners());
    }

    #[test]
    fn observe_all_accepts_subject_handles() {
        let subjects = vec![Subject::new("a"), Subject::new("b")];
        let (target, _) = counting_target();
        let mut manager = SubscriptionManager::builder()
            .sync_target(target)
            .observe_all(subjects.iter().cloned())
            .build()
            .unwrap();
        manager.activate();
        assert!(subjects.iter().all(Subject::has_listeners));
    }

    #[tracing_test::traced_test]
    #[test]
    fn double_activate_warns() {
        let s = Subject::new("s");
        let (target, _) = counting_target();
        let mut manager = SubscriptionManager::new(target, vec![s]).unwrap();
        manager.activate();
        manager.activate();
        assert!(logs_contain("already active"));
    }
}
