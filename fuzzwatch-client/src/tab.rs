//! One document of an origin.

use crate::notifications::NotificationCenter;
use crate::origin::{Origin, OriginSettings};
use fuzzwatch_core::{ClientError, Identity, SharedClock, SharedTransport, TabId};
use fuzzwatch_events::{BusMessage, CrossTabListener, EventBus};
use fuzzwatch_storage::{PersistedStore, TtlCache};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;

struct TabInner {
    id: TabId,
    bus: EventBus,
    store: PersistedStore,
    cache: Arc<TtlCache<Value>>,
    transport: SharedTransport,
    clock: SharedClock,
    notifications: NotificationCenter,
    listener: Mutex<Option<CrossTabListener>>,
    settings: OriginSettings,
}

/// A tab's bus, cache and store handle, plus the origin's shared pieces.
///
/// Cheap to clone; clones are the same tab.
#[derive(Clone)]
pub struct Tab {
    inner: Arc<TabInner>,
}

impl Tab {
    pub(crate) fn open(origin: &Origin) -> Self {
        let id = TabId::new();
        let bus = EventBus::new();
        let settings = origin.settings().clone();
        let clock = Arc::clone(origin.clock());
        let listener = origin.channel().attach(id, bus.clone());
        debug!(tab = %id, "Tab opened");

        Self {
            inner: Arc::new(TabInner {
                id,
                store: PersistedStore::new(
                    Arc::clone(origin.backend()),
                    origin.channel().clone(),
                    id,
                ),
                cache: Arc::new(TtlCache::new(Arc::clone(&clock), settings.cache.clone())),
                transport: Arc::clone(origin.transport()),
                notifications: NotificationCenter::new(Arc::clone(&clock)),
                listener: Mutex::new(Some(listener)),
                bus,
                clock,
                settings,
            }),
        }
    }

    pub fn id(&self) -> TabId {
        self.inner.id
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn store(&self) -> &PersistedStore {
        &self.inner.store
    }

    pub fn cache(&self) -> &Arc<TtlCache<Value>> {
        &self.inner.cache
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.inner.transport
    }

    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn settings(&self) -> &OriginSettings {
        &self.inner.settings
    }

    pub fn publish(&self, message: BusMessage) -> usize {
        self.inner.bus.publish(message)
    }

    /// Stored identity, or `NotLoggedIn`.
    pub fn identity(&self) -> Result<Identity, ClientError> {
        self.inner.store.identity().ok_or(ClientError::NotLoggedIn)
    }

    /// Stored user id, or `NotLoggedIn`.
    pub fn user_id(&self) -> Result<String, ClientError> {
        self.identity().map(|identity| identity.user_id)
    }

    fn listener(&self) -> MutexGuard<'_, Option<CrossTabListener>> {
        self.inner
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver pending changes from other tabs onto this tab's bus.
    ///
    /// Returns 0 once the listener has been handed to [`Tab::spawn_cross_tab`].
    pub fn pump_cross_tab(&self) -> usize {
        match self.listener().as_mut() {
            Some(listener) => listener.pump(),
            None => 0,
        }
    }

    /// Move the cross-tab listener onto the runtime. Only the first call
    /// spawns.
    pub fn spawn_cross_tab(&self) -> Option<JoinHandle<()>> {
        self.listener().take().map(CrossTabListener::spawn)
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.inner.id)
            .field("cached_entries", &self.inner.cache.len())
            .finish()
    }
}
