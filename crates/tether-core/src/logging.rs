#![forbid(unsafe_code)]

//! Subscriber setup for binaries and manual debugging.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! application's call. With the `subscriber` feature, [`init`] installs a
//! `tracing-subscriber` fmt layer filtered by `TETHER_LOG` (falling back to
//! `info`). The `json` feature switches the output to JSON lines.

/// Environment variable holding the filter directive.
pub const ENV_LOG_FILTER: &str = "TETHER_LOG";

/// Install the global subscriber.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "subscriber")]
pub fn init() -> bool {
    init_with_default("info")
}

/// Like [`init`], with `default_directive` used when `TETHER_LOG` is unset.
#[cfg(feature = "subscriber")]
pub fn init_with_default(default_directive: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    #[cfg(feature = "json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "json"))]
    let result = builder.try_init();

    result.is_ok()
}

