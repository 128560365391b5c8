#![forbid(unsafe_code)]

//! Two-pot wallet: a fixed total split between mobile and savings.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tether_core::{Observable, Subject};

/// Dollars shared between the two pots.
pub const WALLET_TOTAL: u32 = 10;

/// Immutable view of a [`Wallet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletState {
    pub total: u32,
    pub mobile: u32,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            total: WALLET_TOTAL,
            mobile: 0,
        }
    }
}

impl WalletState {
    #[must_use]
    pub fn savings(&self) -> u32 {
        self.total - self.mobile
    }

    #[must_use]
    pub fn can_increase(&self) -> bool {
        self.mobile < self.total
    }

    #[must_use]
    pub fn can_decrease(&self) -> bool {
        self.mobile > 0
    }
}

/// Moves dollars between savings and mobile one at a time.
#[derive(Debug)]
pub struct Wallet {
    subject: Subject,
    state: Mutex<WalletState>,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(Subject::new("wallet"))
    }
}

impl Wallet {
    #[must_use]
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            state: Mutex::new(WalletState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> WalletState {
        *self.lock()
    }

    /// Move one dollar from savings to mobile. Ignored when savings is empty.
    pub fn increase_mobile(&self) {
        self.update(|state| {
            if !state.can_increase() {
                return false;
            }
            state.mobile += 1;
            true
        });
    }

    /// Move one dollar from mobile to savings. Ignored when mobile is empty.
    pub fn decrease_mobile(&self) {
        self.update(|state| {
            if !state.can_decrease() {
                return false;
            }
            state.mobile -= 1;
            true
        });
    }

    fn update(&self, apply: impl FnOnce(&mut WalletState) -> bool) {
        let changed = {
            let mut state = self.lock();
            apply(&mut state).then_some(state.mobile)
        };
        match changed {
            Some(mobile) => {
                tracing::info!(mobile, "wallet updated");
                self.subject.notify();
            }
            None => tracing::debug!("wallet update ignored at limit"),
        }
    }
}

impl Observable for Wallet {
    fn subject(&self) -> &Subject {
        &self.subject
    }
}
