//! Property-based tests for the persisted store, request cache and throttle

use fuzzwatch_core::{ManualClock, Schedule, TabId, Theme};
use fuzzwatch_events::CrossTabChannel;
use fuzzwatch_storage::keys::{DOMAIN_ROOTS, DOMAIN_SCHEDULES, HORIZONTAL_SIDEBAR, THEME};
use fuzzwatch_storage::{
    CacheConfig, InvalidationPattern, KvBackend, MemoryBackend, PersistedStore, RateWindow,
    RequestKey, TtlCache,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn store() -> PersistedStore {
    PersistedStore::new(MemoryBackend::shared(), CrossTabChannel::new(8), TabId::new())
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn schedule_strategy() -> impl Strategy<Value = Schedule> {
    (
        "[a-z0-9]{1,12}",
        ".{0,24}",
        "[a-z]{1,10}\\.(com|org|net)",
        "2026-0[1-9]-[0-2][0-9]T00:00:00Z",
        prop::option::of("2026-1[0-2]-[0-2][0-9]T12:00:00Z"),
    )
        .prop_map(|(id, name, domain, start, next)| Schedule {
            schedule_id: id,
            schedule_name: name,
            domain_name: domain,
            start_date: start,
            next_scan: next,
        })
}

fn theme_strategy() -> impl Strategy<Value = Theme> {
    prop::sample::select(Theme::all().to_vec())
}

proptest! {
    /// Persisted values read back exactly as written.
    #[test]
    fn prop_persisted_values_roundtrip(
        roots in prop::collection::vec(".*", 0..8),
        schedules in prop::collection::vec(schedule_strategy(), 0..6),
        theme in theme_strategy(),
        horizontal in any::<bool>(),
    ) {
        let store = store();
        store.set(&DOMAIN_ROOTS, &roots).unwrap();
        store.set(&DOMAIN_SCHEDULES, &schedules).unwrap();
        store.set(&THEME, &theme).unwrap();
        store.set(&HORIZONTAL_SIDEBAR, &horizontal).unwrap();

        prop_assert_eq!(store.get(&DOMAIN_ROOTS), Some(roots));
        prop_assert_eq!(store.get(&DOMAIN_SCHEDULES), Some(schedules));
        prop_assert_eq!(store.get(&THEME), Some(theme));
        prop_assert_eq!(store.get(&HORIZONTAL_SIDEBAR), Some(horizontal));
    }

    /// Arbitrary raw text under the theme key never panics a reader and
    /// yields either a valid theme or the default.
    #[test]
    fn prop_arbitrary_raw_theme_never_panics(raw in ".*") {
        let backend = MemoryBackend::shared();
        backend.set_raw("ui-theme", raw).unwrap();
        let store = PersistedStore::new(backend, CrossTabChannel::new(4), TabId::new());
        let theme = store.theme();
        prop_assert!(Theme::all().contains(&theme));
    }

    /// A read within the TTL of a successful fetch never runs the fetcher.
    #[test]
    fn prop_read_within_ttl_is_cached(
        (ttl_ms, offset) in (1u64..120_000).prop_flat_map(|ttl| (Just(ttl), 0..ttl)),
    ) {
        let clock = ManualClock::starting_now();
        let cache: TtlCache<u64> = TtlCache::new(clock.shared(), CacheConfig::default());
        let key = RequestKey::path("/api/u-1/domain");
        let ttl = Duration::from_millis(ttl_ms);
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        block_on(cache.get_or_fetch(&key, ttl, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(7)
        })).unwrap();

        clock.advance(Duration::from_millis(offset));
        let counter = Arc::clone(&calls);
        let read = block_on(cache.get_or_fetch(&key, ttl, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(8)
        })).unwrap();

        prop_assert_eq!(read.into_value(), 7);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// After an invalidation matching the key, the next read always fetches.
    #[test]
    fn prop_invalidate_then_read_fetches(
        user in "[a-z0-9-]{1,8}",
        body in prop::option::of("[a-z.]{1,16}"),
    ) {
        let clock = ManualClock::starting_now();
        let cache: TtlCache<u64> = TtlCache::new(clock.shared(), CacheConfig::default());
        let path = format!("/api/{}/domain", user);
        let body = body.map(|name| serde_json::json!({ "domain_name": name }));
        let key = RequestKey::new(&path, body.as_ref());
        cache.put(&key, 1);

        prop_assert!(cache.invalidate(&InvalidationPattern::resource(&path)) >= 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        block_on(cache.get_or_fetch(&key, Duration::from_secs(3600), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, String>(2)
        })).unwrap();
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Invalidating a prefix that matches nothing removes nothing.
    #[test]
    fn prop_unmatched_invalidation_is_noop(
        keys in prop::collection::vec("/api/[a-m]{1,6}", 0..10),
        prefix in "/other/[n-z]{1,6}",
    ) {
        let clock = ManualClock::starting_now();
        let cache: TtlCache<u64> = TtlCache::new(clock.shared(), CacheConfig::default());
        for key in &keys {
            cache.put(&RequestKey::path(key), 0);
        }
        let before = cache.len();
        prop_assert_eq!(cache.invalidate(&InvalidationPattern::prefix(prefix)), 0);
        prop_assert_eq!(cache.len(), before);
    }

    /// The second call proceeds iff strictly more than the interval passed.
    #[test]
    fn prop_rate_window_strict_interval(interval_ms in 1u64..10_000, gap_ms in 0u64..20_000) {
        let start = chrono::Utc::now();
        let mut window = RateWindow::new(Duration::from_millis(interval_ms));
        prop_assert!(window.should_proceed(start));
        let later = start + chrono::Duration::milliseconds(gap_ms as i64);
        prop_assert_eq!(window.should_proceed(later), gap_ms > interval_ms);
    }
}
