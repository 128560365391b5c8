#![forbid(unsafe_code)]

//! [`ChangeAwareAdapter`]: turns a list model's coarse notifications into
//! positional operations on a [`RenderSurface`].
//!
//! # Reconcile cycle
//!
//! ```text
//! model fires ─▶ snapshot current items ─▶ diff vs. baseline ─▶ verify
//!                                                            │
//!                     ┌──────── ok ──────────────────────────┤
//!                     ▼                                      ▼ inconsistent
//!             emit ops in order                 Strict: panic
//!                                               Lenient: log + notify_all_changed
//! ```
//!
//! The first reconcile has no baseline and emits a single range insert.
//!
//! # Invariants
//!
//! 1. The baseline is replaced before any op reaches the surface, so a
//!    surface that re-enters the adapter sees consistent state.
//! 2. `item_count()` and `item_at()` always read the live model.
//! 3. Row actions resolve their row by key at call time; a row that is gone
//!    yields [`RowAction::Dropped`] and the action never runs.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tether_core::{DiffPolicy, ListenerRef, Observable, listener_fn};

use crate::diff::{self, DiffItem, DiffOp, DiffStrategy, KeyedDiff};
use crate::surface::RenderSurface;

/// A model backed by an ordered list.
pub trait ListModel: Observable + Send + Sync {
    type Item: DiffItem + Clone + Send + 'static;

    fn item_count(&self) -> usize;

    fn item_at(&self, position: usize) -> Option<Self::Item>;

    /// All items, in order. Override when the model can copy its list in one
    /// step.
    fn snapshot(&self) -> Vec<Self::Item> {
        (0..self.item_count())
            .filter_map(|position| self.item_at(position))
            .collect()
    }
}

/// Identity of a row captured when the row was bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle<K> {
    key: K,
    bound_at: usize,
}

impl<K> RowHandle<K> {
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Position the row had when the handle was taken. Informational only.
    #[must_use]
    pub fn bound_position(&self) -> usize {
        self.bound_at
    }
}

/// Outcome of [`ChangeAwareAdapter::perform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction<R> {
    /// The row resolved to a live position and the action ran.
    Performed(R),
    /// The row no longer exists; the action did not run.
    Dropped,
}

impl<R> RowAction<R> {
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }
}

type Key<M> = <<M as ListModel>::Item as DiffItem>::Key;

struct AdapterInner<M: ListModel> {
    model: Arc<M>,
    surface: Arc<dyn RenderSurface>,
    strategy: Box<dyn DiffStrategy<M::Item>>,
    policy: DiffPolicy,
    baseline: Mutex<Option<Vec<M::Item>>>,
}

impl<M: ListModel> AdapterInner<M> {
    fn reconcile(&self) {
        let current = self.model.snapshot();
        let previous = {
            let mut baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner);
            baseline.replace(current.clone())
        };

        let Some(previous) = previous else {
            tracing::debug!(count = current.len(), "first sync; range insert");
            if !current.is_empty() {
                self.surface.notify_item_range_inserted(0, current.len());
            }
            return;
        };

        let ops = self.strategy.diff(&previous, &current);
        let old_keys: Vec<_> = previous.iter().map(DiffItem::key).collect();
        let new_keys: Vec<_> = current.iter().map(DiffItem::key).collect();
        if let Err(err) = diff::verify(&old_keys, &ops, &new_keys) {
            match self.policy {
                DiffPolicy::Strict => panic!("list adapter produced a bad diff: {err}"),
                DiffPolicy::Lenient => {
                    tracing::error!(error = %err, "list diff did not replay; rebinding every row");
                    self.surface.notify_all_changed();
                    return;
                }
            }
        }

        tracing::debug!(
            old = previous.len(),
            new = current.len(),
            ops = ops.len(),
            "list diff"
        );
        for op in &ops {
            tracing::trace!(?op, "emit");
            match *op {
                DiffOp::Insert { at } => self.surface.notify_item_inserted(at),
                DiffOp::Remove { at } => self.surface.notify_item_removed(at),
                DiffOp::Move { from, to } => self.surface.notify_item_moved(from, to),
                DiffOp::Change { at } => self.surface.notify_item_changed(at),
            }
        }
    }
}

/// Bridges a [`ListModel`] to a [`RenderSurface`].
///
/// Subscribes on construction and unsubscribes on drop.
pub struct ChangeAwareAdapter<M: ListModel + 'static> {
    inner: Arc<AdapterInner<M>>,
    listener: ListenerRef,
}

impl<M: ListModel + 'static> std::fmt::Debug for ChangeAwareAdapter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let baseline = self
            .inner
            .baseline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Vec::len);
        f.debug_struct("ChangeAwareAdapter")
            .field("policy", &self.inner.policy)
            .field("baseline_len", &baseline)
            .finish()
    }
}

impl<M: ListModel + 'static> ChangeAwareAdapter<M> {
    /// Adapter using [`KeyedDiff`] and the build's default [`DiffPolicy`].
    pub fn new(model: Arc<M>, surface: Arc<dyn RenderSurface>) -> Self {
        Self::with_options(model, surface, DiffPolicy::default(), Box::new(KeyedDiff))
    }

    pub fn with_policy(model: Arc<M>, surface: Arc<dyn RenderSurface>, policy: DiffPolicy) -> Self {
        Self::with_options(model, surface, policy, Box::new(KeyedDiff))
    }

    pub fn with_options(
        model: Arc<M>,
        surface: Arc<dyn RenderSurface>,
        policy: DiffPolicy,
        strategy: Box<dyn DiffStrategy<M::Item>>,
    ) -> Self {
        let inner = Arc::new(AdapterInner {
            model,
            surface,
            strategy,
            policy,
            baseline: Mutex::new(None),
        });

        let weak: Weak<AdapterInner<M>> = Arc::downgrade(&inner);
        let listener = listener_fn(move || {
            if let Some(inner) = weak.upgrade() {
                inner.reconcile();
            }
        });
        inner.model.add_listener(&listener);

        Self { inner, listener }
    }

    #[must_use]
    pub fn model(&self) -> &Arc<M> {
        &self.inner.model
    }

    /// Live item count.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.inner.model.item_count()
    }

    /// Live item at `position`.
    #[must_use]
    pub fn item_at(&self, position: usize) -> Option<M::Item> {
        self.inner.model.item_at(position)
    }

    /// Reconcile now, as if the model had fired.
    pub fn sync_now(&self) {
        self.inner.reconcile();
    }

    /// Capture the identity of the row currently at `position`.
    #[must_use]
    pub fn row_handle(&self, position: usize) -> Option<RowHandle<Key<M>>> {
        self.item_at(position).map(|item| RowHandle {
            key: item.key(),
            bound_at: position,
        })
    }

    /// Current position of `handle`'s row, if it still exists.
    ///
    /// With duplicate keys, the occurrence closest to the bound position wins.
    #[must_use]
    pub fn position_of(&self, handle: &RowHandle<Key<M>>) -> Option<usize> {
        let items = self.inner.model.snapshot();
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.key() == handle.key)
            .map(|(position, _)| position)
            .min_by_key(|position| position.abs_diff(handle.bound_at))
    }

    /// Run `action` with the row's live position, or drop it if the row is
    /// gone.
    pub fn perform<R>(
        &self,
        handle: &RowHandle<Key<M>>,
        action: impl FnOnce(usize) -> R,
    ) -> RowAction<R> {
        match self.position_of(handle) {
            Some(position) => RowAction::Performed(action(position)),
            None => {
                tracing::debug!(
                    bound_at = handle.bound_at,
                    "row action dropped; row no longer present"
                );
                RowAction::Dropped
            }
        }
    }
}

impl<M: ListModel + 'static> Drop for ChangeAwareAdapter<M> {
    fn drop(&mut self) {
        self.inner.model.remove_listener(&self.listener);
    }
}
