//! One origin: the backend and cross-tab channel every tab shares.

use crate::config::ClientConfig;
use crate::http::HttpTransport;
use crate::tab::Tab;
use fuzzwatch_core::{FuzzwatchResult, SharedClock, SharedTransport, SystemClock};
use fuzzwatch_events::{CrossTabChannel, DEFAULT_CROSS_TAB_CAPACITY};
use fuzzwatch_storage::{CacheConfig, FileBackend, MemoryBackend, SharedBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Knobs applied to every tab opened from an [`Origin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSettings {
    pub cache: CacheConfig,
    pub refetch_cooldown: Duration,
    pub cross_tab_capacity: usize,
}

impl Default for OriginSettings {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            refetch_cooldown: Duration::from_millis(2000),
            cross_tab_capacity: DEFAULT_CROSS_TAB_CAPACITY,
        }
    }
}

impl OriginSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            cache: config.cache_config(),
            refetch_cooldown: config.refetch_cooldown(),
            cross_tab_capacity: config.cross_tab_capacity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Origin {
    backend: SharedBackend,
    channel: CrossTabChannel,
    transport: SharedTransport,
    clock: SharedClock,
    settings: OriginSettings,
}

impl Origin {
    pub fn new(
        backend: SharedBackend,
        transport: SharedTransport,
        clock: SharedClock,
        settings: OriginSettings,
    ) -> Self {
        Self {
            backend,
            channel: CrossTabChannel::new(settings.cross_tab_capacity),
            transport,
            clock,
            settings,
        }
    }

    /// In-memory origin, mostly for tests and previews.
    pub fn in_memory(transport: SharedTransport, clock: SharedClock) -> Self {
        Self::new(
            MemoryBackend::shared(),
            transport,
            clock,
            OriginSettings::default(),
        )
    }

    /// Origin talking HTTP to `api_base_url`, persisting to `storage_path` when
    /// set.
    pub fn from_config(config: &ClientConfig) -> FuzzwatchResult<Self> {
        let backend: SharedBackend = match &config.storage_path {
            Some(path) => Arc::new(FileBackend::open(path)?),
            None => MemoryBackend::shared(),
        };
        let transport: SharedTransport = Arc::new(HttpTransport::from_config(config)?);
        info!(
            api_base_url = %config.api_base_url,
            persistent = config.storage_path.is_some(),
            "Origin configured"
        );
        Ok(Self::new(
            backend,
            transport,
            SystemClock::shared(),
            OriginSettings::from_config(config),
        ))
    }

    pub fn open_tab(&self) -> Tab {
        Tab::open(self)
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn channel(&self) -> &CrossTabChannel {
        &self.channel
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn settings(&self) -> &OriginSettings {
        &self.settings
    }
}
