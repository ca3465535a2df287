//! Publish/subscribe primitives for sync events
//!
//! Two shapes, for two audiences. Transport events flow through an
//! [`EventBus`] backed by a broadcast channel: subscribers each own a
//! receiver, so a slow or dropped one can never stall the publisher or its
//! siblings. UI-facing state changes use a [`ListenerSet`], an ordered
//! observer registry whose subscriptions are owned by RAII handles, so a
//! forgotten listener unregisters itself instead of leaking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Channel-based event bus; cloning shares the same channel
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone + Send + 'static> EventBus<E> {
    /// Create a bus that buffers up to `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    ///
    /// Having no subscribers is a normal condition (e.g. nothing connected
    /// yet); the event is dropped with a debug log.
    pub fn publish(&self, event: E) {
        if self.sender.send(event).is_err() {
            tracing::debug!("event published with no active subscribers");
        }
    }

    /// Subscribe to events published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

type Listener<E> = Box<dyn Fn(&E) + Send>;

/// Ordered observer registry with handle-owned unsubscription
///
/// Listeners are notified in registration order. Registering the same
/// closure twice is allowed and notifies it twice.
pub struct ListenerSet<E> {
    inner: Arc<Mutex<Vec<(u64, Listener<E>)>>>,
    next_id: AtomicU64,
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<E> ListenerSet<E> {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it stays subscribed for the handle's lifetime
    #[must_use]
    pub fn add_listener(&self, listener: impl Fn(&E) + Send + 'static) -> ListenerHandle<E> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().push((id, Box::new(listener)));
        ListenerHandle {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    /// Invoke every registered listener with the event
    pub fn notify(&self, event: &E) {
        let listeners = self.inner.lock();
        for (_, listener) in listeners.iter() {
            listener(event);
        }
    }

    /// Number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no listeners are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Subscription handle; dropping it unregisters the listener
pub struct ListenerHandle<E> {
    inner: Arc<Mutex<Vec<(u64, Listener<E>)>>>,
    id: u64,
}

impl<E> Drop for ListenerHandle<E> {
    fn drop(&mut self) {
        self.inner.lock().retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bus_delivers_to_all_subscribers() {
        let bus: EventBus<u32> = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(7);

        assert_eq!(first.recv().await.unwrap(), 7);
        assert_eq!(second.recv().await.unwrap(), 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bus_publish_without_subscribers_is_fine() {
        let bus: EventBus<u32> = EventBus::new(8);
        bus.publish(1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropped_subscriber_does_not_block_others() {
        let bus: EventBus<u32> = EventBus::new(8);
        let dropped = bus.subscribe();
        let mut kept = bus.subscribe();
        drop(dropped);

        bus.publish(3);
        assert_eq!(kept.recv().await.unwrap(), 3);
    }

    #[test]
    fn test_listeners_notified_in_registration_order() {
        let set: ListenerSet<&str> = ListenerSet::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first_order = Arc::clone(&order);
        let _first = set.add_listener(move |_| first_order.lock().push("first"));
        let second_order = Arc::clone(&order);
        let _second = set.add_listener(move |_| second_order.lock().push("second"));

        set.notify(&"event");
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_registration_notifies_twice() {
        let set: ListenerSet<()> = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_a = Arc::clone(&calls);
        let _a = set.add_listener(move |()| {
            calls_a.fetch_add(1, Ordering::Relaxed);
        });
        let calls_b = Arc::clone(&calls);
        let _b = set.add_listener(move |()| {
            calls_b.fetch_add(1, Ordering::Relaxed);
        });

        set.notify(&());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_dropping_handle_unsubscribes() {
        let set: ListenerSet<()> = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = Arc::clone(&calls);
        let handle = set.add_listener(move |()| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        });
        set.notify(&());
        drop(handle);
        set.notify(&());

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(set.is_empty());
    }
}
