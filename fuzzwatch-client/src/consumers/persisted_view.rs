use super::lock;
use crate::tab::Tab;
use fuzzwatch_events::{BusMessage, Subscription, Topic};
use fuzzwatch_storage::{PersistedStore, StoreKey};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// A value read from one persisted key, kept current by `Storage` signals.
///
/// Absent and undecodable values read as the default given at construction.
pub struct PersistedView<T> {
    key: StoreKey<T>,
    store: PersistedStore,
    default: T,
    value: Arc<Mutex<T>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T> PersistedView<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(tab: &Tab, key: StoreKey<T>, default: T) -> Self {
        let store = tab.store().clone();
        let value = Arc::new(Mutex::new(store.get_or(&key, default.clone())));

        let sink = Arc::clone(&value);
        let reader = store.clone();
        let fallback = default.clone();
        let subscription = tab.bus().subscribe(Topic::Storage, move |message| {
            if let BusMessage::Storage(change) = message {
                if change.touches(key.name()) {
                    trace!(key = %key, "Re-reading persisted view");
                    *lock(&sink) = reader.get_or(&key, fallback.clone());
                }
            }
        });

        Self {
            key,
            store,
            default,
            value,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn get(&self) -> T {
        lock(&self.value).clone()
    }

    pub fn key(&self) -> StoreKey<T> {
        self.key
    }

    /// Re-read without waiting for a signal.
    pub fn refresh(&self) -> T {
        let current = self.store.get_or(&self.key, self.default.clone());
        *lock(&self.value) = current.clone();
        current
    }

    /// Stop following changes. The last value stays readable.
    pub fn unmount(&self) {
        lock(&self.subscription).take();
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.subscription)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedView")
            .field("key", &self.key)
            .field("value", &*lock(&self.value))
            .finish()
    }
}
