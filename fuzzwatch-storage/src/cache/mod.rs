//! Request cache with explicit freshness.
//!
//! Entries are keyed by [`RequestKey`] (`"{path}:{body}"`) and carry the time
//! they were stored along with their keep time. Freshness is decided per
//! call: the caller passes the stale time to [`TtlCache::get_or_fetch`].
//! Expired entries are swept on every insert and by
//! [`TtlCache::evict_expired`]. Reads return a [`CacheRead`] that says how
//! old the value is and whether the fetcher ran.
//!
//! Failed fetches are never stored. Concurrent misses on one key each run
//! their fetcher unless [`CacheConfig::single_flight`] is set.

mod config;
mod key;
mod read;
mod ttl;

pub use config::{CacheConfig, CacheStats};
pub use key::{InvalidationPattern, RequestKey};
pub use read::CacheRead;
pub use ttl::TtlCache;
