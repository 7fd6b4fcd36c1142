//! In-memory TTL cache.

use super::config::{CacheConfig, CacheStats};
use super::key::{InvalidationPattern, RequestKey};
use super::read::CacheRead;
use fuzzwatch_core::{elapsed_since, SharedClock, Timestamp};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Mutex as FlightLock;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Timestamp,
    keep_time: Duration,
}

impl<V> Entry<V> {
    fn expired(&self, now: Timestamp) -> bool {
        elapsed_since(now, self.stored_at) >= self.keep_time
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Cache lock poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Map from request key to the last successful result.
///
/// At most one entry per key; a write replaces. Each entry carries the keep
/// time it was stored with and is hard-evicted once older than that; every
/// insert sweeps expired entries. The internal locks guard memory only and
/// are never held across an await, so the last completed fetch wins.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    flights: Mutex<HashMap<String, Arc<FlightLock<()>>>>,
    counters: Counters,
    clock: SharedClock,
    config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: SharedClock, config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Return the entry for `key` if it is younger than `ttl`, otherwise run
    /// `fetcher`, store its result and return it. The stored entry is kept
    /// for the configured gc time.
    ///
    /// A failed fetch stores nothing and leaves any older entry in place.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &RequestKey,
        ttl: Duration,
        fetcher: F,
    ) -> Result<CacheRead<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let keep_time = self.config.gc_time;
        self.get_or_fetch_keeping(key, ttl, keep_time, fetcher).await
    }

    /// [`get_or_fetch`](Self::get_or_fetch) with an explicit keep time for
    /// the stored entry.
    pub async fn get_or_fetch_keeping<F, Fut, E>(
        &self,
        key: &RequestKey,
        ttl: Duration,
        keep_time: Duration,
        fetcher: F,
    ) -> Result<CacheRead<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // An entry outlives its stale time.
        let keep_time = keep_time.max(ttl);
        if let Some(read) = self.live(key, ttl) {
            return Ok(read);
        }
        if !self.config.single_flight {
            return self.fetch_and_store(key, keep_time, fetcher).await;
        }

        let flight = self.flight(key);
        let result = {
            let _turn = flight.lock().await;
            // Another caller may have filled the entry while we waited.
            match self.live(key, ttl) {
                Some(read) => Ok(read),
                None => self.fetch_and_store(key, keep_time, fetcher).await,
            }
        };
        drop(flight);
        self.release_flight(key);
        result
    }

    /// Entry for `key` if it is younger than `keep_time`, live or stale.
    /// Entries past their own keep time are never returned.
    pub fn peek(&self, key: &RequestKey, keep_time: Duration) -> Option<CacheRead<V>> {
        let now = self.clock.now();
        let entries = lock(&self.entries);
        let entry = entries.get(key.as_str())?;
        let age = elapsed_since(now, entry.stored_at);
        (age < keep_time && !entry.expired(now))
            .then(|| CacheRead::from_cache(entry.value.clone(), entry.stored_at, age))
    }

    /// Store `value` under `key` as of now, kept for the configured gc time.
    pub fn put(&self, key: &RequestKey, value: V) {
        self.insert(key, value, self.config.gc_time);
    }

    /// Remove every entry matching `pattern`. Returns how many were removed.
    pub fn invalidate(&self, pattern: &InvalidationPattern) -> usize {
        let removed = {
            let mut entries = lock(&self.entries);
            let before = entries.len();
            entries.retain(|key, _| !pattern.matches(key));
            before - entries.len()
        };
        self.counters
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        debug!(pattern = %pattern, removed, "Cache invalidated");
        removed
    }

    pub fn clear(&self) -> usize {
        let removed = {
            let mut entries = lock(&self.entries);
            let count = entries.len();
            entries.clear();
            count
        };
        self.counters
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        debug!(removed, "Cache cleared");
        removed
    }

    /// Hard-evict entries older than the keep time they were stored with.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        self.sweep(&mut entries, now)
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        lock(&self.entries).contains_key(key.as_str())
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
        }
    }

    fn insert(&self, key: &RequestKey, value: V, keep_time: Duration) -> Timestamp {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        self.sweep(&mut entries, now);
        entries.insert(
            key.as_str().to_string(),
            Entry {
                value,
                stored_at: now,
                keep_time,
            },
        );
        now
    }

    fn sweep(&self, entries: &mut HashMap<String, Entry<V>>, now: Timestamp) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            self.counters
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Evicted expired cache entries");
        }
        removed
    }

    fn live(&self, key: &RequestKey, ttl: Duration) -> Option<CacheRead<V>> {
        let now = self.clock.now();
        let entries = lock(&self.entries);
        let entry = entries.get(key.as_str())?;
        let age = elapsed_since(now, entry.stored_at);
        if age >= ttl {
            return None;
        }
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, age_ms = age.as_millis() as u64, "Cache hit");
        Some(CacheRead::from_cache(entry.value.clone(), entry.stored_at, age))
    }

    async fn fetch_and_store<F, Fut, E>(
        &self,
        key: &RequestKey,
        keep_time: Duration,
        fetcher: F,
    ) -> Result<CacheRead<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Cache miss, fetching");

        match fetcher().await {
            Ok(value) => {
                let stored_at = self.insert(key, value.clone(), keep_time);
                self.counters.fetches.fetch_add(1, Ordering::Relaxed);
                Ok(CacheRead::fetched(value, stored_at))
            }
            Err(e) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Fetch failed, nothing cached");
                Err(e)
            }
        }
    }

    fn flight(&self, key: &RequestKey) -> Arc<FlightLock<()>> {
        let mut flights = lock(&self.flights);
        Arc::clone(
            flights
                .entry(key.as_str().to_string())
                .or_insert_with(|| Arc::new(FlightLock::new(()))),
        )
    }

    fn release_flight(&self, key: &RequestKey) {
        let mut flights = lock(&self.flights);
        if flights
            .get(key.as_str())
            .is_some_and(|flight| Arc::strong_count(flight) == 1)
        {
            flights.remove(key.as_str());
        }
    }
}
