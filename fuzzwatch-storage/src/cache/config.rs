//! Cache configuration and counters.

use std::time::Duration;

/// Configuration for the request cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Freshness window used when a query does not pick its own.
    pub stale_time: Duration,
    /// How long stale data stays displayable before hard eviction.
    pub gc_time: Duration,
    /// Serialize concurrent misses per key so only one fetcher runs.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            gc_time: Duration::from_secs(300),
            single_flight: false,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from a live entry.
    pub hits: u64,
    /// Reads that had to run the fetcher.
    pub misses: u64,
    /// Fetchers that completed successfully and were stored.
    pub fetches: u64,
    /// Fetchers that failed. Nothing was stored for these.
    pub fetch_failures: u64,
    /// Entries removed by invalidation or `clear`.
    pub invalidations: u64,
    /// Entries removed for outliving the keep time.
    pub evictions: u64,
    /// Entries currently held.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
