//! In-process event bus for rxbus.
//!
//! Depends only on `rxbus-types` and the tokio runtime -- no IO, no config
//! files. Loading configuration is the job of `rxbus-infra`.

pub mod event;

pub use event::{EventBus, ListenerHandle, Subscription};
