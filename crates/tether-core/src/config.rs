#![forbid(unsafe_code)]

//! Runtime configuration, with environment overrides.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `TETHER_EXECUTION_MODE` | `execution_mode` | `async` |
//! | `TETHER_WORKER_THREADS` | `worker_threads` | `2` |
//! | `TETHER_LISTENER_WARN_THRESHOLD` | `listener_warn_threshold` | `2` |
//! | `TETHER_STRICT_DIFF` | `diff_policy` | strict in debug builds |
//!
//! Unset variables keep the default; set but unparsable ones are an error
//! rather than being silently ignored.

use crate::error::{Result, TetherError};
use crate::exec::{DEFAULT_WORKER_THREADS, ExecutionMode};
use crate::observer::DEFAULT_LISTENER_WARN_THRESHOLD;

pub const ENV_EXECUTION_MODE: &str = "TETHER_EXECUTION_MODE";
pub const ENV_WORKER_THREADS: &str = "TETHER_WORKER_THREADS";
pub const ENV_LISTENER_WARN_THRESHOLD: &str = "TETHER_LISTENER_WARN_THRESHOLD";
pub const ENV_STRICT_DIFF: &str = "TETHER_STRICT_DIFF";

/// What the list adapter does when a computed diff fails its replay check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffPolicy {
    /// Panic with the inconsistency.
    Strict,
    /// Log it and fall back to a full refresh.
    Lenient,
}

impl Default for DiffPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

/// Knobs shared by the models, executors and adapters of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub execution_mode: ExecutionMode,
    /// Worker threads for the default pool (at least 1).
    pub worker_threads: usize,
    /// Listener count above which a subject logs a leak warning.
    pub listener_warn_threshold: usize,
    pub diff_policy: DiffPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Asynchronous,
            worker_threads: DEFAULT_WORKER_THREADS,
            listener_warn_threshold: DEFAULT_LISTENER_WARN_THRESHOLD,
            diff_policy: DiffPolicy::default(),
        }
    }
}

#[inline]
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl RuntimeConfig {
    /// Synchronous execution with strict diff checking.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            execution_mode: ExecutionMode::Synchronous,
            diff_policy: DiffPolicy::Strict,
            ..Self::default()
        }
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `get_env`.
    pub fn from_env_with<F>(get_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = get_env(ENV_EXECUTION_MODE) {
            config.execution_mode =
                ExecutionMode::parse(&raw).ok_or(TetherError::InvalidConfig {
                    key: ENV_EXECUTION_MODE,
                    value: raw,
                })?;
        }
        if let Some(raw) = get_env(ENV_WORKER_THREADS) {
            let threads: usize = raw.trim().parse().map_err(|_| TetherError::InvalidConfig {
                key: ENV_WORKER_THREADS,
                value: raw.clone(),
            })?;
            config.worker_threads = threads.max(1);
        }
        if let Some(raw) = get_env(ENV_LISTENER_WARN_THRESHOLD) {
            config.listener_warn_threshold =
                raw.trim().parse().map_err(|_| TetherError::InvalidConfig {
                    key: ENV_LISTENER_WARN_THRESHOLD,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = get_env(ENV_STRICT_DIFF) {
            let strict = parse_flag(&raw).ok_or(TetherError::InvalidConfig {
                key: ENV_STRICT_DIFF,
                value: raw,
            })?;
            config.diff_policy = if strict {
                DiffPolicy::Strict
            } else {
                DiffPolicy::Lenient
            };
        }

        tracing::debug!(?config, "runtime config resolved");
        Ok(config)
    }

    #[must_use]
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_listener_warn_threshold(mut self, threshold: usize) -> Self {
        self.listener_warn_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_gives_defaults() {
        let config = RuntimeConfig::from_env_with(env(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.execution_mode, ExecutionMode::Asynchronous);
        assert_eq!(config.worker_threads, DEFAULT_WORKER_THREADS);
    }

    #[test]
    fn env_overrides_every_field() {
        let config = RuntimeConfig::from_env_with(env(&[
            (ENV_EXECUTION_MODE, "sync"),
            (ENV_WORKER_THREADS, "4"),
            (ENV_LISTENER_WARN_THRESHOLD, "8"),
            (ENV_STRICT_DIFF, "off"),
        ]))
        .unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Synchronous);
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.listener_warn_threshold, 8);
        assert_eq!(config.diff_policy, DiffPolicy::Lenient);
    }

    #[test]
    fn zero_workers_clamped() {
        let config = RuntimeConfig::from_env_with(env(&[(ENV_WORKER_THREADS, "0")])).unwrap();
        assert_eq!(config.worker_threads, 1);
        assert_eq!(RuntimeConfig::default().with_worker_threads(0).worker_threads, 1);
    }

    #[test]
    fn bad_values_are_errors() {
        let err = RuntimeConfig::from_env_with(env(&[(ENV_EXECUTION_MODE, "eventually")]))
            .unwrap_err();
        assert_eq!(
            err,
            TetherError::InvalidConfig {
                key: ENV_EXECUTION_MODE,
                value: "eventually".into()
            }
        );
        assert!(RuntimeConfig::from_env_with(env(&[(ENV_WORKER_THREADS, "-1")])).is_err());
        assert!(RuntimeConfig::from_env_with(env(&[(ENV_STRICT_DIFF, "maybe")])).is_err());
    }

    #[test]
    fn for_tests_is_synchronous_and_strict() {
        let config = RuntimeConfig::for_tests();
        assert!(config.execution_mode.is_synchronous());
        assert_eq!(config.diff_policy, DiffPolicy::Strict);
    }

    #[test]
    fn builder_chain() {
        let config = RuntimeConfig::default()
            .with_execution_mode(ExecutionMode::Synchronous)
            .with_listener_warn_threshold(5)
            .with_diff_policy(DiffPolicy::Lenient);
        assert!(config.execution_mode.is_synchronous());
        assert_eq!(config.listener_warn_threshold, 5);
        assert_eq!(config.diff_policy, DiffPolicy::Lenient);
    }
}
