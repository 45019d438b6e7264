//! Event marker trait and the type-erased envelope carried by the bus.
//!
//! Any `Clone + Send + Sync + 'static` value is an [`Event`]. On its way
//! through the bus an event travels as an [`ErasedEvent`], which pairs the
//! payload with the `TypeId` used for exact-type dispatch.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Marker trait for values that can be posted through the event bus.
///
/// Blanket-implemented for every thread-safe, cloneable `'static` type, so
/// application types never implement it by hand.
pub trait Event: Any + Clone + Send + Sync + 'static {
    /// Human-readable name of the event type, used in log fields.
    fn event_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T> Event for T where T: Any + Clone + Send + Sync + 'static {}

/// A posted event with its concrete type erased.
///
/// Cloning is cheap: the payload is shared behind an `Arc`, and each
/// subscriber clones the concrete value out only when it downcasts.
#[derive(Clone)]
pub struct ErasedEvent {
    type_id: TypeId,
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ErasedEvent {
    /// Wrap a concrete event.
    ///
    /// Wrapping an `ErasedEvent` returns it unchanged, so an envelope handed
    /// to a typed post is still dispatched under its payload's type.
    pub fn new<T: Event>(event: T) -> Self {
        if let Some(envelope) = (&event as &dyn Any).downcast_ref::<ErasedEvent>() {
            return envelope.clone();
        }
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::event_name(),
            payload: Arc::new(event),
        }
    }

    /// Runtime type identifier of the wrapped event.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the wrapped event.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the wrapped event is exactly a `T` (no subtype matching).
    pub fn is<T: Event>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrow the payload as `T`, if that is its exact type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Clone the payload out as `T`, if that is its exact type.
    pub fn downcast<T: Event>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for ErasedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedEvent")
            .field("type_name", &self.type_name)
            .finish()
    }
}
