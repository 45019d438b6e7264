//! Type-keyed broadcast event bus with sticky replay.
//!
//! Every event type gets its own `tokio::sync::broadcast` channel, created
//! on first subscription and pruned once its last subscriber is gone. Each
//! receiver is an independent queue, so a slow subscriber never stalls a
//! producer. Alongside the live channels the bus keeps one "sticky" slot
//! per type holding the most recent event posted with
//! [`post_sticky`](EventBus::post_sticky).

use std::any::TypeId;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use rxbus_types::{BusConfig, BusError, ErasedEvent, Event};
use tokio::sync::broadcast;
use tracing::debug;

use super::listener::{spawn_listener, ListenerHandle};
use super::subscription::Subscription;

/// Process-wide publish/subscribe hub keyed by exact event type.
///
/// Cloning the bus is cheap and every clone shares the same channels and
/// sticky store, so a single instance can be handed to all collaborators.
/// For code that cannot be wired explicitly there is
/// [`EventBus::global`](EventBus::global).
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    /// Live channel per event type (type id -> broadcast sender).
    channels: DashMap<TypeId, broadcast::Sender<ErasedEvent>>,
    /// Latest sticky event per type.
    sticky: DashMap<TypeId, ErasedEvent>,
    /// Held for the whole of a post, and while a sticky subscription takes
    /// its snapshot. Never held across an await point.
    dispatch: Mutex<()>,
    config: BusConfig,
}

impl EventBus {
    /// Create a bus with the given configuration.
    pub fn new(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: DashMap::new(),
                sticky: DashMap::new(),
                dispatch: Mutex::new(()),
                config,
            }),
        }
    }

    /// The configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Broadcast an event to every current subscriber of its exact type.
    ///
    /// Returns the number of subscriptions the event was queued for. Events
    /// posted while nobody listens are dropped. An [`ErasedEvent`] passed here
    /// is dispatched under its payload's type, as with
    /// [`post_erased`](Self::post_erased).
    pub fn post<T: Event>(&self, event: T) -> usize {
        self.dispatch(ErasedEvent::new(event), false)
    }

    /// Store an event as the sticky value for its type, then broadcast it.
    pub fn post_sticky<T: Event>(&self, event: T) -> usize {
        self.dispatch(ErasedEvent::new(event), true)
    }

    /// Untyped variant of [`post`](Self::post).
    ///
    /// # Errors
    ///
    /// [`BusError::InvalidArgument`] if `event` is `None`.
    pub fn post_erased(&self, event: Option<ErasedEvent>) -> Result<usize, BusError> {
        let event = require_event(event)?;
        Ok(self.dispatch(event, false))
    }

    /// Untyped variant of [`post_sticky`](Self::post_sticky).
    ///
    /// # Errors
    ///
    /// [`BusError::InvalidArgument`] if `event` is `None`.
    pub fn post_sticky_erased(&self, event: Option<ErasedEvent>) -> Result<usize, BusError> {
        let event = require_event(event)?;
        Ok(self.dispatch(event, true))
    }

    /// Subscribe to future events of type `T`.
    ///
    /// Nothing posted before this call is replayed, sticky or not.
    pub fn subscribe<T: Event>(&self) -> Subscription<T> {
        let receiver = self.register(TypeId::of::<T>());
        debug!(event_type = T::event_name(), "subscribed");
        Subscription::new(receiver, None)
    }

    /// Subscribe to type `T`, starting with its current sticky value.
    ///
    /// The sticky snapshot and the receiver registration happen under the
    /// dispatch lock, so an event posted concurrently is observed exactly
    /// once: either as the replayed value or as a live event.
    pub fn subscribe_sticky<T: Event>(&self) -> Subscription<T> {
        let type_id = TypeId::of::<T>();
        let (receiver, replay) = {
            let _guard = self.lock_dispatch();
            let receiver = self.register(type_id);
            let replay = self
                .inner
                .sticky
                .get(&type_id)
                .and_then(|event| event.downcast::<T>());
            (receiver, replay)
        };
        debug!(
            event_type = T::event_name(),
            replayed = replay.is_some(),
            "subscribed (sticky)"
        );
        Subscription::new(receiver, replay)
    }

    /// Run `handler` on a spawned task for every future `T` event.
    ///
    /// Handler errors are logged and the listener keeps going. The listener
    /// runs until [`ListenerHandle::dispose`] is called or the bus is
    /// dropped; dropping the handle does not stop it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn listen<T, F, E>(&self, handler: F) -> ListenerHandle
    where
        T: Event,
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Display + Send + 'static,
    {
        spawn_listener(self.subscribe::<T>(), handler)
    }

    /// [`listen`](Self::listen) over the sticky sequence of `T`.
    pub fn listen_sticky<T, F, E>(&self, handler: F) -> ListenerHandle
    where
        T: Event,
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: Display + Send + 'static,
    {
        spawn_listener(self.subscribe_sticky::<T>(), handler)
    }

    /// Whether at least one live subscription exists, of any type.
    pub fn has_subscribers(&self) -> bool {
        self.inner
            .channels
            .iter()
            .any(|entry| entry.value().receiver_count() > 0)
    }

    /// Number of live subscriptions for type `T`.
    pub fn subscriber_count<T: Event>(&self) -> usize {
        self.inner
            .channels
            .get(&TypeId::of::<T>())
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Current sticky value for `T`, if any.
    pub fn get_sticky<T: Event>(&self) -> Option<T> {
        self.inner
            .sticky
            .get(&TypeId::of::<T>())
            .and_then(|event| event.downcast::<T>())
    }

    /// Remove and return the sticky value for `T`, if any.
    pub fn remove_sticky<T: Event>(&self) -> Option<T> {
        let removed = self
            .inner
            .sticky
            .remove(&TypeId::of::<T>())
            .and_then(|(_, event)| event.downcast::<T>());
        if removed.is_some() {
            debug!(event_type = T::event_name(), "removed sticky event");
        }
        removed
    }

    /// Drop every sticky value. Live subscriptions are unaffected.
    pub fn clear_sticky(&self) {
        self.inner.sticky.clear();
        debug!("cleared sticky events");
    }

    /// Number of event types that currently hold a sticky value.
    pub fn sticky_count(&self) -> usize {
        self.inner.sticky.len()
    }

    fn dispatch(&self, event: ErasedEvent, sticky: bool) -> usize {
        let _guard = self.lock_dispatch();
        let type_id = event.type_id();
        let type_name = event.type_name();

        if sticky {
            self.inner.sticky.insert(type_id, event.clone());
        }

        let sender = self
            .inner
            .channels
            .get(&type_id)
            .map(|sender| sender.value().clone());
        let delivered = match sender {
            // `send` only fails when there are no receivers.
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            // Subscriptions register under the shard lock, so this cannot
            // race a receiver being created on the pruned sender.
            self.inner
                .channels
                .remove_if(&type_id, |_, sender| sender.receiver_count() == 0);
        }

        if self.inner.config.log_events {
            debug!(event_type = type_name, sticky, delivered, "posted event");
        }
        delivered
    }

    fn register(&self, type_id: TypeId) -> broadcast::Receiver<ErasedEvent> {
        let capacity = self.inner.config.effective_capacity();
        self.inner
            .channels
            .entry(type_id)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.inner
            .dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.inner.channels.len())
            .field("sticky", &self.inner.sticky.len())
            .field("channel_capacity", &self.inner.config.channel_capacity)
            .finish()
    }
}

fn require_event(event: Option<ErasedEvent>) -> Result<ErasedEvent, BusError> {
    event.ok_or_else(|| BusError::InvalidArgument("event must not be absent".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
