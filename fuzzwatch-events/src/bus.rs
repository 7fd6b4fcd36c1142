//! Same-tab publish/subscribe.

use crate::topic::{BusMessage, Topic};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, trace};

type Handler = Arc<dyn Fn(&BusMessage) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Handler)>>,
}

struct BusInner {
    registry: Mutex<Registry>,
}

impl BusInner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Handlers never run under this lock, so a poisoned registry still
        // holds a consistent map.
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, topic: Topic, id: u64) -> bool {
        // Removed handlers are dropped after the lock is released: a handler
        // may own another Subscription whose drop re-enters the registry.
        let removed: Vec<(u64, Handler)> = {
            let mut registry = self.registry();
            let Some(list) = registry.handlers.get_mut(&topic) else {
                return false;
            };
            let (gone, kept) = std::mem::take(list)
                .into_iter()
                .partition(|(handler_id, _)| *handler_id == id);
            *list = kept;
            gone
        };
        !removed.is_empty()
    }
}

/// Publish/subscribe hub scoped to one tab.
///
/// `publish` invokes every handler of the message's topic synchronously, in
/// subscription order, before it returns. Handlers may publish or subscribe
/// from inside a callback: delivery iterates a snapshot taken before the
/// first handler runs, so a handler added mid-delivery first sees the next
/// message.
///
/// Clones share the same subscriber set.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Register `handler` for `topic`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        let mut registry = self.inner.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        trace!(topic = %topic, subscription = id, "Subscribed");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            topic,
            id,
            active: true,
        }
    }

    /// Deliver `message` to every current subscriber of its topic.
    ///
    /// Returns the number of handlers invoked. Publishing with no subscribers
    /// is a no-op.
    pub fn publish(&self, message: BusMessage) -> usize {
        let topic = message.topic();
        let snapshot: Vec<Handler> = {
            let registry = self.inner.registry();
            registry
                .handlers
                .get(&topic)
                .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        debug!(topic = %topic, subscribers = snapshot.len(), "Publish");
        for handler in &snapshot {
            handler(&message);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .registry()
            .handlers
            .get(&topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry();
        let total: usize = registry.handlers.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("subscriptions", &total)
            .finish()
    }
}

/// Handle for one registered handler. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the handler"]
pub struct Subscription {
    bus: Weak<BusInner>,
    topic: Topic,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active && self.bus.strong_count() > 0
    }

    /// Remove the handler now. Calling this twice is harmless.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.topic, self.id) {
                trace!(topic = %self.topic, subscription = self.id, "Unsubscribed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
