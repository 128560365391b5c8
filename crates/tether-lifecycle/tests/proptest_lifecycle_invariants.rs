//! Property-based invariant tests for `SubscriptionManager`.
//!
//! For any interleaving of activate/deactivate/fire:
//!
//! 1. Each inactive→active transition syncs the view exactly once.
//! 2. Each subject fire while active syncs the view exactly once.
//! 3. Fires while inactive never reach the view.
//! 4. Listener registration mirrors the state: one listener per subject while
//!    active, none while inactive.

use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tether_core::Subject;
use tether_lifecycle::{SubscriptionManager, SyncTarget};

const SUBJECTS: usize = 3;

#[derive(Debug, Clone)]
enum Step {
    Activate,
    Deactivate,
    Fire(usize),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Activate),
        Just(Step::Deactivate),
        (0..SUBJECTS).prop_map(Step::Fire),
    ]
}

proptest! {
    #[test]
    fn sync_count_follows_state_machine(steps in proptest::collection::vec(step_strategy(), 0..80)) {
        let subjects: Vec<Subject> = (0..SUBJECTS).map(|_| Subject::new("prop")).collect();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let target: Arc<dyn SyncTarget> = Arc::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let mut manager = SubscriptionManager::new(target, subjects.clone()).unwrap();

        let mut active = false;
        let mut expected = 0usize;
        for step in steps {
            match step {
                Step::Activate => {
                    manager.activate();
                    if !active {
                        expected += 1;
                    }
                    active = true;
                }
                Step::Deactivate => {
                    manager.deactivate();
                    active = false;
                }
                Step::Fire(i) => {
                    subjects[i].notify();
                    if active {
                        expected += 1;
                    }
                }
            }
            prop_assert_eq!(count.load(Ordering::SeqCst), expected);
            prop_assert_eq!(manager.is_active(), active);
            for subject in &subjects {
                prop_assert_eq!(subject.listener_count(), usize::from(active));
            }
        }
    }
}
