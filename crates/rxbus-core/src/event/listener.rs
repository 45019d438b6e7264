//! Callback-driven listeners with explicit disposal.
//!
//! A listener owns a [`Subscription`] and drains it on its own tokio task,
//! feeding each event to a handler. Handler failures stay inside the
//! listener: they are logged and the next event is processed as usual.

use std::fmt::Display;

use rxbus_types::Event;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::subscription::Subscription;

/// Handle to a running listener.
///
/// The listener keeps running until [`dispose`](Self::dispose) is called or
/// the bus goes away. Dropping the handle does not stop it.
#[derive(Debug)]
pub struct ListenerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop the listener. No event is handed to the handler after the
    /// current one, if any, returns. Safe to call more than once.
    ///
    /// The underlying subscription is released by the listener task, so it
    /// still counts towards [`EventBus::has_subscribers`] until that task
    /// wakes up. Use [`dispose_and_wait`](Self::dispose_and_wait) when the
    /// caller needs the release to have happened.
    ///
    /// [`EventBus::has_subscribers`]: super::EventBus::has_subscribers
    pub fn dispose(&self) {
        self.token.cancel();
    }

    /// Stop the listener and wait until its subscription is released.
    pub async fn dispose_and_wait(self) {
        self.token.cancel();
        self.join().await;
    }

    /// Whether the listener has been disposed or has stopped on its own.
    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled() || self.task.is_finished()
    }

    /// Wait for the listener task to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("listener task ended abnormally: {e}");
        }
    }
}

pub(crate) fn spawn_listener<T, F, E>(mut subscription: Subscription<T>, mut handler: F) -> ListenerHandle
where
    T: Event,
    F: FnMut(T) -> Result<(), E> + Send + 'static,
    E: Display + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                next = subscription.recv() => match next {
                    Some(event) => {
                        if let Err(e) = handler(event) {
                            warn!(event_type = T::event_name(), error = %e, "listener handler failed");
                        }
                    }
                    None => break,
                },
            }
        }
        debug!(event_type = T::event_name(), "listener stopped");
    });

    ListenerHandle { token, task }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use rxbus_types::BusConfig;

    use crate::event::EventBus;

    #[derive(Debug, Clone, PartialEq)]
    struct Reading(i32);

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "timed out waiting for {expected} events, saw {}",
            counter.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn listener_receives_posted_events() {
        let bus = EventBus::new(BusConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));

        let handle = {
            let seen = Arc::clone(&seen);
            let count = Arc::clone(&count);
            bus.listen(move |reading: Reading| -> Result<(), String> {
                seen.lock().unwrap().push(reading.0);
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        bus.post(Reading(1));
        bus.post(Reading(2));
        wait_for(&count, 2).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        handle.dispose();
        handle.join().await;
    }

    #[tokio::test]
    async fn handler_error_does_not_stop_listener_or_others() {
        let bus = EventBus::new(BusConfig::default());
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let healthy_calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = Arc::clone(&failing_calls);
            bus.listen(move |reading: Reading| {
                calls.fetch_add(1, Ordering::SeqCst);
                if reading.0 < 0 {
                    Err(format!("negative reading {}", reading.0))
                } else {
                    Ok(())
                }
            })
        };
        let healthy = {
            let calls = Arc::clone(&healthy_calls);
            bus.listen(move |_: Reading| -> Result<(), String> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        bus.post(Reading(-1));
        bus.post(Reading(5));
        wait_for(&failing_calls, 2).await;
        wait_for(&healthy_calls, 2).await;

        assert!(!failing.is_disposed());
        failing.dispose();
        healthy.dispose();
    }

    #[tokio::test]
    async fn disposed_listener_receives_nothing_more() {
        let bus = EventBus::new(BusConfig::default());
        let count = Arc::new(AtomicUsize::new(0));

        let handle = {
            let count = Arc::clone(&count);
            bus.listen(move |_: Reading| -> Result<(), String> {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        bus.post(Reading(1));
        wait_for(&count, 1).await;

        handle.dispose();
        assert!(handle.is_disposed());
        handle.join().await;

        assert!(!bus.has_subscribers());
        bus.post(Reading(2));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispose_and_wait_releases_subscription() {
        let bus = EventBus::new(BusConfig::default());
        let count = Arc::new(AtomicUsize::new(0));

        let handle = {
            let count = Arc::clone(&count);
            bus.listen(move |_: Reading| -> Result<(), String> {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        assert_eq!(bus.subscriber_count::<Reading>(), 1);

        handle.dispose_and_wait().await;

        assert!(!bus.has_subscribers());
        assert_eq!(bus.post(Reading(1)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dispose_during_handler_stops_before_next_event() {
        let bus = EventBus::new(BusConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let entered = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let handle = {
            let seen = Arc::clone(&seen);
            let entered = Arc::clone(&entered);
            bus.listen(move |reading: Reading| -> Result<(), String> {
                entered.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx.recv_timeout(Duration::from_secs(2));
                seen.lock().unwrap().push(reading.0);
                Ok(())
            })
        };

        bus.post(Reading(1));
        bus.post(Reading(2));
        wait_for(&entered, 1).await;

        handle.dispose();
        release_tx.send(()).unwrap();
        handle.join().await;

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(entered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn handler_never_sees_older_sticky_than_its_event() {
        let bus = EventBus::new(BusConfig::default());
        let count = Arc::new(AtomicUsize::new(0));
        let stale = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let reader = bus.clone();
            let count = Arc::clone(&count);
            let stale = Arc::clone(&stale);
            bus.listen(move |reading: Reading| -> Result<(), String> {
                match reader.get_sticky::<Reading>() {
                    Some(current) if current.0 >= reading.0 => {}
                    other => stale.lock().unwrap().push((reading.0, other)),
                }
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        for i in 0..50 {
            bus.post_sticky(Reading(i));
        }
        wait_for(&count, 50).await;

        let stale = stale.lock().unwrap().clone();
        assert!(stale.is_empty(), "stale sticky reads: {stale:?}");
        handle.dispose_and_wait().await;
    }

    #[tokio::test]
    async fn sticky_listener_starts_with_sticky_value() {
        let bus = EventBus::new(BusConfig::default());
        bus.post_sticky(Reading(42));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));
        let handle = {
            let seen = Arc::clone(&seen);
            let count = Arc::clone(&count);
            bus.listen_sticky(move |reading: Reading| -> Result<(), String> {
                seen.lock().unwrap().push(reading.0);
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        wait_for(&count, 1).await;
        bus.post(Reading(43));
        wait_for(&count, 2).await;

        assert_eq!(*seen.lock().unwrap(), vec![42, 43]);
        handle.dispose();
    }

    #[tokio::test]
    async fn listener_stops_when_bus_is_dropped() {
        let bus = EventBus::new(BusConfig::default());
        let handle = bus.listen(|_: Reading| -> Result<(), String> { Ok(()) });

        drop(bus);
        handle.join().await;
    }
}
