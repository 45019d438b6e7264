//! Lazily created process-wide bus.
//!
//! Prefer passing an [`EventBus`] clone to collaborators explicitly; the
//! global instance is for code that cannot be wired that way.

use std::sync::OnceLock;

use rxbus_types::{BusConfig, BusError};
use tracing::debug;

use super::bus::EventBus;

static GLOBAL_BUS: OnceLock<EventBus> = OnceLock::new();

impl EventBus {
    /// The process-wide bus, created with default settings on first use.
    pub fn global() -> &'static EventBus {
        GLOBAL_BUS.get_or_init(|| {
            debug!("initialized global event bus with defaults");
            EventBus::new(BusConfig::default())
        })
    }

    /// Install a configured process-wide bus before anything uses it.
    ///
    /// # Errors
    ///
    /// [`BusError::AlreadyInitialized`] if the global bus already exists,
    /// whether from an earlier call or from [`global`](Self::global).
    pub fn init_global(config: BusConfig) -> Result<&'static EventBus, BusError> {
        let mut installed = false;
        let bus = GLOBAL_BUS.get_or_init(|| {
            installed = true;
            debug!(?config, "initialized global event bus");
            EventBus::new(config)
        });
        if installed {
            Ok(bus)
        } else {
            Err(BusError::AlreadyInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct GlobalPing(u8);

    #[test]
    fn global_is_a_single_shared_instance() {
        let first = EventBus::global();
        let second = EventBus::global();
        assert!(std::ptr::eq(first, second));

        assert_eq!(
            EventBus::init_global(BusConfig::default()).unwrap_err(),
            BusError::AlreadyInitialized
        );
    }

    #[test]
    fn global_sticky_survives_across_call_sites() {
        EventBus::global().post_sticky(GlobalPing(3));
        let mut sub = EventBus::global().subscribe_sticky::<GlobalPing>();
        assert_eq!(sub.try_recv(), Some(GlobalPing(3)));
        assert_eq!(EventBus::global().remove_sticky::<GlobalPing>(), Some(GlobalPing(3)));
    }
}
