use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;

use crate::events::ObjectEvent;

type Listener = Arc<dyn Fn(&ObjectEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        // A panicking listener never runs under the lock, so poisoning carries no torn state
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Synchronous publish/subscribe scoped to one application instance.
///
/// Events are delivered in registration order to the listeners registered at
/// publish time. There is no replay and no persistence.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it stays registered until the handle is dropped
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ObjectEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().push((id, Arc::new(listener)));
        tracing::trace!("Event listener {} subscribed", id);
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Bridge the bus into a channel for async consumers such as SSE streams
    #[must_use = "dropping the subscription closes the channel"]
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<ObjectEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            // Receiver gone means the consumer is tearing down
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    pub fn publish(&self, event: ObjectEvent) {
        // Snapshot so listeners may (un)subscribe while being notified
        let listeners: Vec<Listener> = self
            .inner
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::debug!(
            "Publishing {} for {} to {} listeners",
            event.name(),
            event.subject(),
            listeners.len()
        );

        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

/// Handle for a registered listener
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let removed = {
                let mut listeners = bus.listeners();
                listeners
                    .iter()
                    .position(|(id, _)| *id == self.id)
                    .map(|index| listeners.remove(index))
            };
            // Released outside the lock: the listener may own further subscriptions
            drop(removed);
            tracing::trace!("Event listener {} unsubscribed", self.id);
        }
    }
}
