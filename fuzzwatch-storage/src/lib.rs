//! fuzzwatch Storage
//!
//! Three state holders sit below the query layer:
//!
//! - [`kv`]: the persisted key-value store, durable ground truth for identity
//!   and preferences. Readers never see an error: absent, corrupt and
//!   unreadable values all read as `None`.
//! - [`cache`]: the in-memory request cache with per-call freshness windows.
//!   Never persisted.
//! - [`throttle`]: per-operation cooldown guards for refetches triggered by
//!   notifications.

pub mod cache;
pub mod kv;
pub mod throttle;

pub use cache::{
    CacheConfig, CacheRead, CacheStats, InvalidationPattern, RequestKey, TtlCache,
};
pub use kv::{
    keys, FileBackend, KvBackend, MemoryBackend, PersistedStore, SharedBackend, StoreKey,
};
pub use throttle::{RateWindow, Throttle, ThrottleSet};
