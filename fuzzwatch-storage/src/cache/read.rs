//! Result of a cache read, carrying freshness metadata.

use fuzzwatch_core::Timestamp;
use std::time::Duration;

/// A value read through the cache.
///
/// `age` is measured at read time against the cache's clock. A value that
/// was just fetched has age zero and `was_cache_hit() == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    stored_at: Timestamp,
    age: Duration,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// A live or displayable entry found in the cache.
    pub fn from_cache(value: T, stored_at: Timestamp, age: Duration) -> Self {
        Self {
            value,
            stored_at,
            age,
            was_cache_hit: true,
        }
    }

    /// A value the fetcher just produced.
    pub fn fetched(value: T, stored_at: Timestamp) -> Self {
        Self {
            value,
            stored_at,
            age: Duration::ZERO,
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn stored_at(&self) -> Timestamp {
        self.stored_at
    }

    pub fn age(&self) -> Duration {
        self.age
    }

    /// Whether the value has outlived `stale_time`.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.age >= stale_time
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            stored_at: self.stored_at,
            age: self.age,
            was_cache_hit: self.was_cache_hit,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
