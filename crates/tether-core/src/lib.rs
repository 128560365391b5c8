#![forbid(unsafe_code)]

//! Core: change notification, dual-mode execution, errors and configuration.
//!
//! # Role in Tether
//! `tether-core` is the leaf of the workspace. Models own a [`Subject`] and
//! fire it after each settled mutation; they run slow work through a
//! [`Dispatcher`] whose [`ExecutionMode`] decides whether that work happens
//! inline (tests) or on a worker pool with completion marshaled back to the
//! UI thread (production).
//!
//! # How it fits in the system
//! `tether-lifecycle` attaches views to subjects for the duration of a host's
//! active window, and `tether-adapters` turns a list model's notifications
//! into positional diff operations. Both depend only on this crate.

pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod observer;

pub use config::{DiffPolicy, RuntimeConfig};
pub use error::{Result, TetherError};
pub use exec::{
    BackgroundExecutor, Dispatcher, ExecutionMode, Job, UiPoster, UiQueue, UiTask, WorkerPool,
};
pub use observer::{Listener, ListenerRef, Observable, Subject, listener_fn};
