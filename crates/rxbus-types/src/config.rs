//! Configuration types for the event bus.
//!
//! `BusConfig` is the `config.toml` shape read by `rxbus-infra`. All fields
//! have defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for an `EventBus` instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Per-type broadcast buffer. A subscriber that falls further behind
    /// than [`effective_capacity`](Self::effective_capacity) skips the
    /// oldest events instead of stalling producers.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Emit a `debug!` record for every post.
    #[serde(default)]
    pub log_events: bool,
}

/// Largest per-type buffer a bus will allocate.
///
/// `tokio::sync::broadcast` allocates the whole ring up front, so this caps
/// what a config file can make the first subscription allocate.
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 16;

fn default_channel_capacity() -> usize {
    1024
}

impl BusConfig {
    /// The buffer size a channel is actually created with.
    ///
    /// `channel_capacity` clamped to `1..=MAX_CHANNEL_CAPACITY` and rounded
    /// up to the next power of two, which is what `tokio::sync::broadcast`
    /// allocates anyway.
    pub fn effective_capacity(&self) -> usize {
        self.channel_capacity
            .clamp(1, MAX_CHANNEL_CAPACITY)
            .next_power_of_two()
    }

    /// Whether `channel_capacity` lies outside the range a bus accepts.
    pub fn is_capacity_clamped(&self) -> bool {
        !(1..=MAX_CHANNEL_CAPACITY).contains(&self.channel_capacity)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            log_events: false,
        }
    }
}
