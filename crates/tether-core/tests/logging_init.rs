#![cfg(feature = "subscriber")]

//! Global subscriber installation.
//!
//! Lives in its own test binary: once a global subscriber is set, the
//! `#[traced_test]` captures in the unit tests stop seeing events.

use tether_core::logging;

#[test]
fn second_init_reports_false() {
    let _ = logging::init_with_default("warn");
    assert!(!logging::init());
    assert!(!logging::init_with_default("debug"));
}
