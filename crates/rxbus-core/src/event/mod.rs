//! Typed publish/subscribe event bus with sticky replay.
//!
//! Provides an [`EventBus`] that fans each posted event out to every live
//! subscriber of the event's exact type, and keeps the latest "sticky"
//! event per type for subscribers that arrive later.

pub mod bus;
pub mod global;
pub mod listener;
pub mod subscription;

pub use bus::EventBus;
pub use listener::ListenerHandle;
pub use subscription::Subscription;
