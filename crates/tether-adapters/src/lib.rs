#![forbid(unsafe_code)]

//! List adapters: keep a positional rendering surface in step with a list
//! model that only says "something changed".
//!
//! # Role in Tether
//! A [`ChangeAwareAdapter`] subscribes to a [`ListModel`], snapshots it on
//! every fire and diffs the snapshot against the previous one with a
//! [`DiffStrategy`] ([`KeyedDiff`] by default). The resulting [`DiffOp`]s
//! are replayed against the old keys before anything is emitted, so a broken
//! diff is caught instead of corrupting the surface.
//!
//! # Row actions
//! Positions go stale while animations are in flight. Take a [`RowHandle`]
//! when binding a row and run row-scoped actions through
//! [`ChangeAwareAdapter::perform`]; actions on rows that have since
//! disappeared come back as [`RowAction::Dropped`].

pub mod adapter;
pub mod diff;
pub mod surface;

pub use adapter::{ChangeAwareAdapter, ListModel, RowAction, RowHandle};
pub use diff::{DiffItem, DiffOp, DiffStrategy, KeyedDiff, diff, replay, verify};
pub use surface::{RecordingSurface, RenderSurface, SurfaceEvent};
