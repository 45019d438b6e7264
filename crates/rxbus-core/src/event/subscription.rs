//! Typed view over one subscriber's broadcast receiver.

use futures_util::Stream;
use rxbus_types::{ErasedEvent, Event};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// A live, independent sequence of `T` events from an [`EventBus`].
///
/// Dropping the subscription (or calling [`release`](Self::release))
/// unregisters it. The sequence ends only when the bus itself is dropped.
///
/// [`EventBus`]: super::EventBus
pub struct Subscription<T: Event> {
    receiver: broadcast::Receiver<ErasedEvent>,
    /// Sticky value handed out before any live event.
    replay: Option<T>,
}

impl<T: Event> Subscription<T> {
    pub(crate) fn new(receiver: broadcast::Receiver<ErasedEvent>, replay: Option<T>) -> Self {
        Self { receiver, replay }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the bus has been dropped. If this subscriber fell
    /// more than the channel capacity behind, the skipped events are logged
    /// and the oldest retained event is returned.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(event) = self.replay.take() {
            return Some(event);
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if let Some(event) = event.downcast::<T>() {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => log_lag::<T>(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        if let Some(event) = self.replay.take() {
            return Some(event);
        }
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if let Some(event) = event.downcast::<T>() {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => log_lag::<T>(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Whether a sticky value is still waiting to be handed out.
    pub fn has_pending_replay(&self) -> bool {
        self.replay.is_some()
    }

    /// Release the subscription. Equivalent to dropping it.
    pub fn release(self) {}

    /// Convert into a `Stream` of events, ending when the bus is dropped.
    pub fn into_stream(mut self) -> impl Stream<Item = T> + Send {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }
}

impl<T: Event> Drop for Subscription<T> {
    fn drop(&mut self) {
        debug!(event_type = T::event_name(), "subscription released");
    }
}

impl<T: Event> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &T::event_name())
            .field("pending_replay", &self.replay.is_some())
            .field("queued", &self.receiver.len())
            .finish()
    }
}

fn log_lag<T: Event>(skipped: u64) {
    warn!(
        event_type = T::event_name(),
        skipped, "subscriber lagged; oldest events were skipped"
    );
}
