#![forbid(unsafe_code)]

//! Error type shared by every Tether crate.
//!
//! # Failure Modes
//!
//! | Failure | Raised by | Behavior |
//! |---------|-----------|----------|
//! | Missing collaborator | builders / constructors | `InvalidArgument`, fails fast |
//! | Diff does not replay | list adapter | `InconsistentDiff`, panics or degrades per policy |
//! | Worker pool gone | `BackgroundExecutor::submit` | `ExecutorShutdown` |
//! | Bad env value | `RuntimeConfig::from_env` | `InvalidConfig` |
//!
//! A row action whose row has disappeared is not an error at all; see
//! `tether_adapters::RowAction::Dropped`.

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TetherError>;

/// Errors raised by Tether components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TetherError {
    /// A required collaborator was missing at construction time.
    InvalidArgument(&'static str),
    /// Replaying a computed diff against the old snapshot did not reproduce
    /// the new snapshot.
    InconsistentDiff {
        /// Length of the captured new snapshot.
        expected: usize,
        /// Length of the replayed sequence.
        replayed: usize,
        /// First position where replayed and captured keys differ.
        first_mismatch: Option<usize>,
    },
    /// Background work was submitted after the executor stopped.
    ExecutorShutdown,
    /// A configuration value could not be parsed.
    InvalidConfig { key: &'static str, value: String },
}

impl std::fmt::Display for TetherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::InconsistentDiff {
                expected,
                replayed,
                first_mismatch,
            } => {
                write!(
                    f,
                    "inconsistent diff: replay produced {replayed} items, expected {expected}"
                )?;
                if let Some(pos) = first_mismatch {
                    write!(f, " (first mismatch at {pos})")?;
                }
                Ok(())
            }
            Self::ExecutorShutdown => write!(f, "background executor has shut down"),
            Self::InvalidConfig { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
        }
    }
}

impl std::error::Error for TetherError {}
