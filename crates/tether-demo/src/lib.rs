#![forbid(unsafe_code)]

//! Reference models and headless views wired together with Tether.
//!
//! - [`wallet::Wallet`]: synchronous state, one notification per settled
//!   mutation.
//! - [`counter::Counter`]: background work through a
//!   [`Dispatcher`](tether_core::Dispatcher).
//! - [`playlist::Playlist`]: a list model rendered through a
//!   [`ChangeAwareAdapter`](tether_adapters::ChangeAwareAdapter).
//!
//! [`graph::ObjectGraph`] builds all of them from one
//! [`RuntimeConfig`](tether_core::RuntimeConfig); [`session::run`] drives
//! them through a scripted set of screens.

pub mod cli;
pub mod counter;
pub mod graph;
pub mod playlist;
pub mod session;
pub mod views;
pub mod wallet;

pub use counter::{Counter, CounterState};
pub use graph::ObjectGraph;
pub use playlist::{Colour, Playlist, Track};
pub use session::{Script, SessionReport};
pub use views::{CounterView, FrameLog, LoggingSurface, PlaylistHeader, WalletView};
pub use wallet::{Wallet, WalletState};
