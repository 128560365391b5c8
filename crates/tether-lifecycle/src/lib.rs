#![forbid(unsafe_code)]

//! Lifecycle-bound subscriptions: keep a view in step with its models only
//! while the hosting screen is active.
//!
//! A host (screen, panel, dialog, whatever the surrounding UI framework
//! calls it) owns one [`SubscriptionManager`] by composition and forwards its
//! start/stop callbacks to it. No base type is required.
//!
//! ```ignore
//! let mut manager = SubscriptionManager::builder()
//!     .sync_target(view.clone())
//!     .observe(&wallet)
//!     .observe(&account)
//!     .build()?;
//!
//! manager.on_lifecycle(LifecycleEvent::Started); // registers + syncs once
//! manager.on_lifecycle(LifecycleEvent::Stopped); // unregisters everything
//! ```

pub mod manager;

pub use manager::{
    LifecycleEvent, LifecycleState, SubscriptionManager, SubscriptionManagerBuilder, SyncTarget,
};
