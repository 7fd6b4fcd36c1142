//! Typed, JSON-encoding handle over a [`KvBackend`].

use super::backend::{KvBackend, SharedBackend};
use super::keys::StoreKey;
use fuzzwatch_core::{StorageError, TabId};
use fuzzwatch_events::{CrossTabChannel, StorageChange};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// One tab's handle on the origin's persisted store.
///
/// Reads never fail: an absent key, an undecodable value and a backend error
/// all read as `None`, with the last two logged. Writes log their failures
/// and also return them for callers that care. Every successful write is
/// signalled on the cross-tab channel under this tab's id; consumers in the
/// same tab must be told through an explicit bus publish.
#[derive(Debug, Clone)]
pub struct PersistedStore {
    backend: SharedBackend,
    channel: CrossTabChannel,
    tab: TabId,
}

impl PersistedStore {
    pub fn new(backend: SharedBackend, channel: CrossTabChannel, tab: TabId) -> Self {
        Self {
            backend,
            channel,
            tab,
        }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn backend(&self) -> &dyn KvBackend {
        self.backend.as_ref()
    }

    /// Read and decode `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &StoreKey<T>) -> Option<T> {
        let raw = self.read_raw(key.name())?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = StorageError::Corrupt {
                    key: key.name().to_string(),
                    reason: e.to_string(),
                };
                warn!(key = key.name(), error = %err, "Ignoring undecodable persisted value");
                None
            }
        }
    }

    /// Read `key`, falling back to the reader's own default.
    pub fn get_or<T: DeserializeOwned>(&self, key: &StoreKey<T>, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &StoreKey<T>) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Whether a raw value exists under `key`, decodable or not.
    pub fn contains<T>(&self, key: &StoreKey<T>) -> bool {
        self.read_raw(key.name()).is_some()
    }

    /// Encode and write `value` under `key`.
    ///
    /// Writing the value already stored is a no-op and is not signalled, so
    /// tabs mirroring the same data into the store do not wake each other.
    pub fn set<T: Serialize>(&self, key: &StoreKey<T>, value: &T) -> Result<(), StorageError> {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                let err = StorageError::Encode {
                    key: key.name().to_string(),
                    reason: e.to_string(),
                };
                warn!(key = key.name(), error = %err, "Persisted write failed");
                return Err(err);
            }
        };
        if self.read_raw(key.name()).as_deref() == Some(raw.as_str()) {
            debug!(key = key.name(), "Persisted value unchanged");
            return Ok(());
        }
        let result = self.backend.set_raw(key.name(), raw);

        match result {
            Ok(()) => {
                debug!(key = key.name(), tab = %self.tab, "Persisted value");
                self.channel
                    .signal(StorageChange::for_key(key.name(), self.tab));
                Ok(())
            }
            Err(e) => {
                warn!(key = key.name(), error = %e, "Persisted write failed");
                Err(e)
            }
        }
    }

    pub fn remove<T>(&self, key: &StoreKey<T>) -> Result<(), StorageError> {
        match self.backend.remove_raw(key.name()) {
            Ok(()) => {
                debug!(key = key.name(), tab = %self.tab, "Removed persisted value");
                self.channel
                    .signal(StorageChange::for_key(key.name(), self.tab));
                Ok(())
            }
            Err(e) => {
                warn!(key = key.name(), error = %e, "Persisted remove failed");
                Err(e)
            }
        }
    }

    /// Drop every key. Signalled as a keyless change.
    pub fn clear(&self) -> Result<(), StorageError> {
        match self.backend.clear() {
            Ok(()) => {
                debug!(tab = %self.tab, "Cleared persisted store");
                self.channel.signal(StorageChange::from_source(self.tab));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Persisted clear failed");
                Err(e)
            }
        }
    }

    fn read_raw(&self, name: &str) -> Option<String> {
        match self.backend.get_raw(name) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = name, error = %e, "Persisted read failed, treating as absent");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::backend::MemoryBackend;
    use crate::kv::keys::{DOMAIN_ROOTS, THEME};
    use fuzzwatch_core::Theme;
    use fuzzwatch_events::{BusMessage, EventBus, Topic};
    use std::sync::{Arc, Mutex};

    fn store() -> (PersistedStore, Arc<MemoryBackend>, CrossTabChannel) {
        let backend = Arc::new(MemoryBackend::new());
        let channel = CrossTabChannel::new(16);
        let store = PersistedStore::new(backend.clone(), channel.clone(), TabId::new());
        (store, backend, channel)
    }

    #[test]
    fn test_set_then_get() {
        let (store, _, _) = store();
        let roots = vec!["example.com".to_string(), "example.org".to_string()];
        store.set(&DOMAIN_ROOTS, &roots).unwrap();
        assert_eq!(store.get(&DOMAIN_ROOTS), Some(roots));
    }

    #[test]
    fn test_absent_reads_none_and_default() {
        let (store, _, _) = store();
        assert_eq!(store.get(&THEME), None);
        assert_eq!(store.get_or(&THEME, Theme::System), Theme::System);
        assert_eq!(store.get_or(&THEME, Theme::System), Theme::System);
        assert!(store.get_or_default(&DOMAIN_ROOTS).is_empty());
    }

    #[test]
    fn test_corrupt_value_reads_none() {
        let (store, backend, _) = store();
        backend.set_raw("ui-theme", "{not json".to_string()).unwrap();
        assert!(store.contains(&THEME));
        assert_eq!(store.get(&THEME), None);
        assert_eq!(store.get_or_default(&THEME), Theme::System);
    }

    #[test]
    fn test_wrong_shape_reads_none() {
        let (store, backend, _) = store();
        backend.set_raw("domainRoots", "42".to_string()).unwrap();
        assert_eq!(store.get(&DOMAIN_ROOTS), None);
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let (store, backend, _) = store();
        store.set(&THEME, &Theme::Dark).unwrap();
        backend.set_unavailable(true);

        assert_eq!(store.get(&THEME), None);
        assert!(matches!(
            store.set(&THEME, &Theme::Light),
            Err(StorageError::Unavailable { .. })
        ));

        backend.set_unavailable(false);
        assert_eq!(store.get(&THEME), Some(Theme::Dark));
    }

    #[test]
    fn test_quota_failure_leaves_value_absent() {
        let backend = Arc::new(MemoryBackend::with_quota(8));
        let store = PersistedStore::new(backend, CrossTabChannel::new(4), TabId::new());
        let roots = vec!["a-very-long-domain-name.example".to_string()];
        assert!(matches!(
            store.set(&DOMAIN_ROOTS, &roots),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.get(&DOMAIN_ROOTS), None);
    }

    #[test]
    fn test_writes_signal_other_tabs_only() {
        let (store, backend, channel) = store();
        let other = PersistedStore::new(backend, channel.clone(), TabId::new());

        let other_bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = other_bus.subscribe(Topic::Storage, move |msg| {
            if let BusMessage::Storage(change) = msg {
                sink.lock().unwrap().push(change.key.clone());
            }
        });
        let mut other_listener = channel.attach(other.tab(), other_bus);

        let own_bus = EventBus::new();
        let own_hits = Arc::new(Mutex::new(0usize));
        let own_sink = Arc::clone(&own_hits);
        let _own_sub = own_bus.subscribe(Topic::Storage, move |_| *own_sink.lock().unwrap() += 1);
        let mut own_listener = channel.attach(store.tab(), own_bus);

        store.set(&THEME, &Theme::Dark).unwrap();
        store.remove(&THEME).unwrap();
        store.clear().unwrap();

        other_listener.pump();
        own_listener.pump();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("ui-theme".to_string()), Some("ui-theme".to_string()), None]
        );
        assert_eq!(*own_hits.lock().unwrap(), 0);
        assert_eq!(other.get(&THEME), None);
    }

    #[test]
    fn test_failed_write_does_not_signal() {
        let (store, backend, channel) = store();
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&hits);
        let _sub = bus.subscribe(Topic::Storage, move |_| *sink.lock().unwrap() += 1);
        let mut listener = channel.attach(TabId::new(), bus);

        backend.set_unavailable(true);
        let _ = store.set(&THEME, &Theme::Light);
        listener.pump();
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_rewriting_same_value_is_silent() {
        let (store, _, channel) = store();
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&hits);
        let _sub = bus.subscribe(Topic::Storage, move |_| *sink.lock().unwrap() += 1);
        let mut listener = channel.attach(TabId::new(), bus);

        store.set(&THEME, &Theme::Dark).unwrap();
        store.set(&THEME, &Theme::Dark).unwrap();
        store.set(&THEME, &Theme::Light).unwrap();
        listener.pump();
        assert_eq!(*hits.lock().unwrap(), 2);
    }
}
