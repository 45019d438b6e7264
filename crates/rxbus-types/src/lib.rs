//! Shared types for rxbus.
//!
//! The event marker trait and erased envelope, the bus configuration shape,
//! and the error type. No runtime dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod event;

pub use config::{BusConfig, MAX_CHANNEL_CAPACITY};
pub use error::BusError;
pub use event::{ErasedEvent, Event};
