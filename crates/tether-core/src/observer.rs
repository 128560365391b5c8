#![forbid(unsafe_code)]

//! Payload-free change notification: [`Subject`] and [`Listener`].
//!
//! # Design
//!
//! A [`Subject`] is a cheap, clonable handle to a shared listener set. Every
//! clone sees the same listeners, so a model can hand out its subject to a
//! lifecycle manager or list adapter without lending out a borrow of itself.
//!
//! Listeners are `Arc<dyn Listener>` and are compared by allocation address:
//! registering the same `Arc` twice is a no-op, and removal only matches the
//! exact `Arc` that was added.
//!
//! # Invariants
//!
//! 1. The listener set never holds two handles to the same allocation.
//! 2. `notify()` snapshots the set before invoking anything, so a listener
//!    that adds or removes listeners mid-fire cannot skip or crash delivery
//!    to the others in that snapshot.
//! 3. No internal lock is held while a listener runs.
//! 4. Firing order is registration order today, but callers must not rely on
//!    it.
//!
//! # Failure Modes
//!
//! - **Leaked listener**: more than `warn_threshold` registered listeners logs
//!   a warning. The usual cause is a host that registered on start and never
//!   removed on stop.
//! - **Removing an unknown listener**: no-op, logged at `warn`; it almost
//!   always means add/remove were called with different `Arc`s.
//! - **Panicking listener**: logged at `error`, then the panic resumes on the
//!   notifying thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Listener count above which registration logs a leak warning.
pub const DEFAULT_LISTENER_WARN_THRESHOLD: usize = 2;

/// Something that wants to hear "something changed".
pub trait Listener: Send + Sync {
    /// Called once per fire of every subject this listener is registered on.
    fn on_change(&self);
}

impl<F> Listener for F
where
    F: Fn() + Send + Sync,
{
    fn on_change(&self) {
        self()
    }
}

/// Shared listener handle; identity is the allocation.
pub type ListenerRef = Arc<dyn Listener>;

/// Wrap a closure as a [`ListenerRef`].
pub fn listener_fn(f: impl Fn() + Send + Sync + 'static) -> ListenerRef {
    Arc::new(f)
}

#[inline]
fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    // Compare data addresses only; vtable pointers are not unique.
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

struct SubjectInner {
    listeners: Vec<ListenerRef>,
    fire_count: u64,
}

struct SubjectShared {
    label: &'static str,
    warn_threshold: usize,
    inner: Mutex<SubjectInner>,
}

/// A set of listeners that can be fired with no payload.
///
/// Cloning a `Subject` creates another handle to the **same** listener set.
#[derive(Clone)]
pub struct Subject {
    shared: Arc<SubjectShared>,
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Subject")
            .field("label", &self.shared.label)
            .field("listener_count", &inner.listeners.len())
            .field("fire_count", &inner.fire_count)
            .finish()
    }
}

impl Default for Subject {
    fn default() -> Self {
        Self::new("subject")
    }
}

impl Subject {
    /// Create a subject; `label` only shows up in logs.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self::with_warn_threshold(label, DEFAULT_LISTENER_WARN_THRESHOLD)
    }

    /// Create a subject that warns once more than `threshold` listeners are
    /// registered.
    #[must_use]
    pub fn with_warn_threshold(label: &'static str, threshold: usize) -> Self {
        Self {
            shared: Arc::new(SubjectShared {
                label,
                warn_threshold: threshold,
                inner: Mutex::new(SubjectInner {
                    listeners: Vec::new(),
                    fire_count: 0,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubjectInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Label given at construction.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.shared.label
    }

    /// Register `listener`. Adding an already-registered listener is a no-op.
    pub fn add_listener(&self, listener: &ListenerRef) {
        let count = {
            let mut inner = self.lock();
            if inner.listeners.iter().any(|l| same_listener(l, listener)) {
                return;
            }
            inner.listeners.push(Arc::clone(listener));
            inner.listeners.len()
        };
        tracing::trace!(subject = self.shared.label, count, "listener added");
        if count > self.shared.warn_threshold {
            tracing::warn!(
                subject = self.shared.label,
                count,
                threshold = self.shared.warn_threshold,
                "listener count above threshold; check that hosts remove listeners when they stop"
            );
        }
    }

    /// Unregister `listener`. Removing an absent listener is a no-op.
    pub fn remove_listener(&self, listener: &ListenerRef) {
        let removed = {
            let mut inner = self.lock();
            let before = inner.listeners.len();
            inner.listeners.retain(|l| !same_listener(l, listener));
            before != inner.listeners.len()
        };
        if removed {
            tracing::trace!(subject = self.shared.label, "listener removed");
        } else {
            tracing::warn!(
                subject = self.shared.label,
                "removed a listener that was never added; add and remove must use the same Arc"
            );
        }
    }

    /// Whether any listener is registered.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        !self.lock().listeners.is_empty()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Number of times this subject has fired.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.lock().fire_count
    }

    /// Invoke every currently registered listener once, on this thread.
    ///
    /// Owning models call this only after their state has fully settled.
    ///
    /// # Panics
    ///
    /// Resumes any panic raised by a listener, after logging it.
    pub fn notify(&self) {
        let snapshot: Vec<ListenerRef> = {
            let mut inner = self.lock();
            inner.fire_count += 1;
            inner.listeners.clone()
        };
        tracing::trace!(
            subject = self.shared.label,
            listeners = snapshot.len(),
            "notify"
        );
        for listener in &snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener.on_change())) {
                tracing::error!(
                    subject = self.shared.label,
                    "listener panicked during on_change"
                );
                panic::resume_unwind(payload);
            }
        }
    }

    /// Whether `self` and `other` are handles to the same listener set.
    #[must_use]
    pub fn same_subject(&self, other: &Subject) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// A model that exposes change notification through a [`Subject`].
pub trait Observable {
    /// The subject fired after each settled mutation.
    fn subject(&self) -> &Subject;

    /// See [`Subject::add_listener`].
    fn add_listener(&self, listener: &ListenerRef) {
        self.subject().add_listener(listener);
    }

    /// See [`Subject::remove_listener`].
    fn remove_listener(&self, listener: &ListenerRef) {
        self.subject().remove_listener(listener);
    }

    /// See [`Subject::has_listeners`].
    fn has_listeners(&self) -> bool {
        self.subject().has_listeners()
    }
}

impl Observable for Subject {
    fn subject(&self) -> &Subject {
        self
    }
}

impl<T: Observable + ?Sized> Observable for Arc<T> {
    fn subject(&self) -> &Subject {
        (**self).subject()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (ListenerRef, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let l = listener_fn(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (l, count)
    }

    #[test]
    fn notify_reaches_every_listener_once() {
        let subject = Subject::with_warn_threshold("test", 10);
        let (a, a_count) = counting();
        let (b, b_count) = counting();
        let (c, c_count) = counting();
        subject.add_listener(&a);
        subject.add_listener(&b);
        subject.add_listener(&c);

        subject.notify();
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
        assert_eq!(c_count.load(Ordering::SeqCst), 1);
        assert_eq!(subject.fire_count(), 1);
    }

    #[test]
    fn adding_twice_is_noop() {
        let subject = Subject::new("test");
        let (a, count) = counting();
        subject.add_listener(&a);
        subject.add_listener(&a);
        assert_eq!(subject.listener_count(), 1);

        subject.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_arcs_of_equal_closures_are_distinct_listeners() {
        let subject = Subject::new("test");
        let a = listener_fn(|| {});
        let b = listener_fn(|| {});
        subject.add_listener(&a);
        subject.add_listener(&b);
        assert_eq!(subject.listener_count(), 2);
    }

    #[test]
    fn removing_absent_listener_is_noop() {
        let subject = Subject::new("test");
        let (a, _) = counting();
        let (b, _) = counting();
        subject.add_listener(&a);
        subject.remove_listener(&b);
        assert_eq!(subject.listener_count(), 1);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let subject = Subject::new("test");
        let (a, count) = counting();
        subject.add_listener(&a);
        subject.notify();
        subject.remove_listener(&a);
        subject.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!subject.has_listeners());
    }

    #[test]
    fn clone_shares_listeners() {
        let s1 = Subject::new("test");
        let s2 = s1.clone();
        let (a, count) = counting();
        s1.add_listener(&a);
        s2.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(s1.same_subject(&s2));
        assert!(!s1.same_subject(&Subject::new("other")));
    }

    #[test]
    fn self_removal_during_fire_keeps_others() {
        let subject = Subject::with_warn_threshold("test", 10);
        let (first, first_count) = counting();
        let (last, last_count) = counting();

        let slot: Arc<Mutex<Option<ListenerRef>>> = Arc::new(Mutex::new(None));
        let slot_in = Arc::clone(&slot);
        let subject_in = subject.clone();
        let remover = listener_fn(move || {
            if let Some(me) = slot_in.lock().unwrap().as_ref() {
                subject_in.remove_listener(me);
            }
        });
        *slot.lock().unwrap() = Some(Arc::clone(&remover));

        subject.add_listener(&first);
        subject.add_listener(&remover);
        subject.add_listener(&last);

        subject.notify();
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(last_count.load(Ordering::SeqCst), 1);
        assert_eq!(subject.listener_count(), 2);

        subject.notify();
        assert_eq!(first_count.load(Ordering::SeqCst), 2);
        assert_eq!(last_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listener_added_during_fire_waits_for_next_fire() {
        let subject = Subject::with_warn_threshold("test", 10);
        let (late, late_count) = counting();
        let subject_in = subject.clone();
        let late_in = Arc::clone(&late);
        let adder = listener_fn(move || subject_in.add_listener(&late_in));
        subject.add_listener(&adder);

        subject.notify();
        assert_eq!(late_count.load(Ordering::SeqCst), 0);
        subject.notify();
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_can_be_shared_between_subjects() {
        let s1 = Subject::new("one");
        let s2 = Subject::new("two");
        let (a, count) = counting();
        s1.add_listener(&a);
        s2.add_listener(&a);
        s1.notify();
        s2.notify();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_listener_propagates() {
        let subject = Subject::new("test");
        let bad = listener_fn(|| panic!("boom"));
        subject.add_listener(&bad);
        let result = panic::catch_unwind(AssertUnwindSafe(|| subject.notify()));
        assert!(result.is_err());
        // Subject stays usable afterwards.
        subject.remove_listener(&bad);
        subject.notify();
        assert_eq!(subject.fire_count(), 2);
    }

    #[test]
    fn struct_listener() {
        struct Flag(AtomicUsize);
        impl Listener for Flag {
            fn on_change(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        let flag = Arc::new(Flag(AtomicUsize::new(0)));
        let as_listener: ListenerRef = flag.clone();
        let subject = Subject::new("test");
        subject.add_listener(&as_listener);
        subject.notify();
        assert_eq!(flag.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observable_trait_delegates() {
        struct Model {
            subject: Subject,
        }
        impl Observable for Model {
            fn subject(&self) -> &Subject {
                &self.subject
            }
        }
        let model = Arc::new(Model {
            subject: Subject::new("model"),
        });
        let (a, count) = counting();
        model.add_listener(&a);
        assert!(model.has_listeners());
        model.subject().notify();
        model.remove_listener(&a);
        assert!(!model.has_listeners());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_format() {
        let subject = Subject::new("wallet");
        let dbg = format!("{subject:?}");
        assert!(dbg.contains("Subject"));
        assert!(dbg.contains("wallet"));
        assert!(dbg.contains("listener_count"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn warns_above_threshold() {
        let subject = Subject::with_warn_threshold("crowded", 1);
        let (a, _) = counting();
        let (b, _) = counting();
        subject.add_listener(&a);
        assert!(!logs_contain("listener count above threshold"));
        subject.add_listener(&b);
        assert!(logs_contain("listener count above threshold"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn warns_on_unknown_removal() {
        let subject = Subject::new("test");
        let (a, _) = counting();
        subject.remove_listener(&a);
        assert!(logs_contain("never added"));
    }
}
