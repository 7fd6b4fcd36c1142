//! Cached reads.
//!
//! A [`Query`] binds one request to a tab's cache. Each `fetch` runs the
//! state machine
//!
//! ```text
//! Idle ──► Fetching ──► Fresh
//!              │   ▲        │ ttl expiry, refetch, invalidation
//!              ▼   └────────┘
//!           Errored ──► Fetching on the next read
//! ```
//!
//! There is no retry timer. Stale data within the keep time stays visible
//! while a fetch is in flight and after it fails.

use crate::tab::Tab;
use fuzzwatch_core::{ApiRequest, ClientError};
use fuzzwatch_storage::{CacheConfig, InvalidationPattern, PersistedStore, RequestKey};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub gc_time: Duration,
}

impl QueryOptions {
    pub const fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time,
            gc_time,
        }
    }

    pub const fn secs(stale_secs: u64, gc_secs: u64) -> Self {
        Self::new(Duration::from_secs(stale_secs), Duration::from_secs(gc_secs))
    }
}

impl From<&CacheConfig> for QueryOptions {
    fn from(config: &CacheConfig) -> Self {
        Self::new(config.stale_time, config.gc_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Fetching,
    Fresh,
    Errored,
}

/// What a consumer renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<ClientError>,
    pub status: QueryStatus,
}

#[derive(Debug)]
struct QueryState<T> {
    data: Option<T>,
    error: Option<ClientError>,
    status: QueryStatus,
}

type SuccessHook<T> = Arc<dyn Fn(&T, &PersistedStore) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ClientError, &PersistedStore) + Send + Sync>;

/// A cached read of one resource.
pub struct Query<T> {
    tab: Tab,
    request: ApiRequest,
    key: RequestKey,
    options: QueryOptions,
    missing: Option<String>,
    state: Arc<Mutex<QueryState<T>>>,
    mounted: Arc<AtomicBool>,
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            tab: self.tab.clone(),
            request: self.request.clone(),
            key: self.key.clone(),
            options: self.options,
            missing: self.missing.clone(),
            state: Arc::clone(&self.state),
            mounted: Arc::clone(&self.mounted),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("options", &self.options)
            .field("missing", &self.missing)
            .field("mounted", &self.mounted.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T> Query<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(tab: &Tab, request: ApiRequest, options: QueryOptions) -> Self {
        let key = RequestKey::new(&request.path, request.body.as_ref());
        Self {
            tab: tab.clone(),
            request,
            key,
            options,
            missing: None,
            state: Arc::new(Mutex::new(QueryState {
                data: None,
                error: None,
                status: QueryStatus::Idle,
            })),
            mounted: Arc::new(AtomicBool::new(true)),
            on_success: None,
            on_error: None,
        }
    }

    /// Disable the query while `value` is blank. `parameter` names it in the
    /// resulting [`ClientError::Disabled`].
    pub fn requires(mut self, parameter: &str, value: &str) -> Self {
        if value.trim().is_empty() && self.missing.is_none() {
            self.missing = Some(parameter.to_string());
        }
        self
    }

    /// Run after every network fetch that succeeded, mounted or not.
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T, &PersistedStore) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    /// Run after every failed fetch, mounted or not.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClientError, &PersistedStore) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.missing.is_none()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Stop updating this consumer. Fetches still land in the cache.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn mount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    fn state(&self) -> MutexGuard<'_, QueryState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> QuerySnapshot<T> {
        let state = self.state();
        QuerySnapshot {
            data: state.data.clone(),
            is_loading: state.status == QueryStatus::Fetching,
            error: state.error.clone(),
            status: state.status,
        }
    }

    pub fn data(&self) -> Option<T> {
        self.state().data.clone()
    }

    pub fn status(&self) -> QueryStatus {
        self.state().status
    }

    /// Read through the cache, fetching when the entry is missing or older
    /// than the stale time.
    pub async fn fetch(&self) -> Result<T, ClientError> {
        if let Some(parameter) = &self.missing {
            return Err(ClientError::Disabled {
                parameter: parameter.clone(),
            });
        }

        self.begin();
        let transport = Arc::clone(self.tab.transport());
        let request = self.request.clone();
        let read = self
            .tab
            .cache()
            .get_or_fetch_keeping(
                &self.key,
                self.options.stale_time,
                self.options.gc_time,
                move || async move {
                    let value = transport.send(request).await?;
                    // Only payloads that decode are worth caching.
                    T::deserialize(&value)?;
                    Ok::<Value, ClientError>(value)
                },
            )
            .await;

        let outcome = read.and_then(|read| {
            let fetched = read.was_cache_miss();
            T::deserialize(read.value())
                .map(|data| (data, fetched))
                .map_err(ClientError::from)
        });

        match outcome {
            Ok((data, fetched)) => {
                debug!(key = %self.key, fetched, "Query resolved");
                if fetched {
                    if let Some(hook) = &self.on_success {
                        hook(&data, self.tab.store());
                    }
                }
                if self.is_mounted() {
                    let mut state = self.state();
                    state.data = Some(data.clone());
                    state.error = None;
                    state.status = QueryStatus::Fresh;
                }
                Ok(data)
            }
            Err(error) => {
                warn!(key = %self.key, error = %error, "Query failed");
                if let Some(hook) = &self.on_error {
                    hook(&error, self.tab.store());
                }
                if self.is_mounted() {
                    let mut state = self.state();
                    state.error = Some(error.clone());
                    state.status = QueryStatus::Errored;
                }
                Err(error)
            }
        }
    }

    /// Drop the cached entry for this request and fetch again.
    pub async fn refetch(&self) -> Result<T, ClientError> {
        if self.is_enabled() {
            self.tab
                .cache()
                .invalidate(&InvalidationPattern::exact(&self.key));
        }
        self.fetch().await
    }

    fn begin(&self) {
        if !self.is_mounted() {
            return;
        }
        let has_data = self.state().data.is_some();
        let stale = if has_data {
            None
        } else {
            self.tab
                .cache()
                .peek(&self.key, self.options.gc_time)
                .and_then(|read| T::deserialize(read.value()).ok())
        };
        let mut state = self.state();
        if stale.is_some() {
            state.data = stale;
        }
        state.status = QueryStatus::Fetching;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::Origin;
    use fuzzwatch_core::{CountResponse, HttpMethod, ManualClock};
    use fuzzwatch_test_utils::MockTransport;
    use serde_json::json;

    const COUNT: &str = "/api/u-1/permutations-count";

    fn setup() -> (Arc<MockTransport>, ManualClock, Tab) {
        let mock = MockTransport::new().shared();
        let clock = ManualClock::starting_now();
        let origin = Origin::in_memory(mock.clone(), clock.shared());
        (mock, clock, origin.open_tab())
    }

    fn count_query(tab: &Tab) -> Query<CountResponse> {
        Query::new(tab, ApiRequest::get(COUNT), QueryOptions::secs(300, 600))
    }

    #[tokio::test]
    async fn test_fetch_caches_within_stale_time() {
        let (mock, clock, tab) = setup();
        mock.set_response(HttpMethod::Get, COUNT, json!({ "count": 4 }));
        let query = count_query(&tab);
        assert_eq!(query.status(), QueryStatus::Idle);

        assert_eq!(query.fetch().await.unwrap().count, 4);
        clock.advance(Duration::from_secs(299));
        assert_eq!(query.fetch().await.unwrap().count, 4);
        assert_eq!(mock.call_count(HttpMethod::Get, COUNT), 1);

        clock.advance(Duration::from_secs(1));
        query.fetch().await.unwrap();
        assert_eq!(mock.call_count(HttpMethod::Get, COUNT), 2);

        let snapshot = query.snapshot();
        assert_eq!(snapshot.status, QueryStatus::Fresh);
        assert!(!snapshot.is_loading);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_refetch_always_hits_network() {
        let (mock, _clock, tab) = setup();
        mock.push_response(HttpMethod::Get, COUNT, json!({ "count": 1 }));
        mock.push_response(HttpMethod::Get, COUNT, json!({ "count": 2 }));
        let query = count_query(&tab);
        assert_eq!(query.fetch().await.unwrap().count, 1);
        assert_eq!(query.refetch().await.unwrap().count, 2);
        assert_eq!(query.data().map(|c| c.count), Some(2));
    }

    #[tokio::test]
    async fn test_disabled_query_never_fires() {
        let (mock, _clock, tab) = setup();
        let query = count_query(&tab).requires("user_id", "  ");
        assert!(!query.is_enabled());
        assert_eq!(
            query.fetch().await,
            Err(ClientError::Disabled {
                parameter: "user_id".to_string()
            })
        );
        assert_eq!(query.status(), QueryStatus::Idle);
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_error_keeps_stale_data_and_caches_nothing() {
        let (mock, clock, tab) = setup();
        mock.push_response(HttpMethod::Get, COUNT, json!({ "count": 9 }));
        mock.push_error(
            HttpMethod::Get,
            COUNT,
            ClientError::Http {
                status: 500,
                message: "down".to_string(),
            },
        );
        let query = count_query(&tab);
        query.fetch().await.unwrap();
        clock.advance(Duration::from_secs(301));

        assert!(query.fetch().await.is_err());
        let snapshot = query.snapshot();
        assert_eq!(snapshot.status, QueryStatus::Errored);
        assert_eq!(snapshot.data.map(|c| c.count), Some(9));
        assert_eq!(snapshot.error.and_then(|e| e.status()), Some(500));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_cached() {
        let (mock, _clock, tab) = setup();
        mock.push_response(HttpMethod::Get, COUNT, json!({ "total": 1 }));
        mock.push_response(HttpMethod::Get, COUNT, json!({ "count": 1 }));
        let query = count_query(&tab);

        assert!(matches!(query.fetch().await, Err(ClientError::Decode { .. })));
        assert!(!tab.cache().contains(query.key()));
        assert_eq!(query.fetch().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_new_query_shows_stale_entry_while_fetching() {
        let (mock, clock, tab) = setup();
        mock.set_response(HttpMethod::Get, COUNT, json!({ "count": 5 }));
        count_query(&tab).fetch().await.unwrap();
        clock.advance(Duration::from_secs(400));

        let gate = mock.hold(HttpMethod::Get, COUNT);
        let query = count_query(&tab);
        let pending = tokio::spawn({
            let query = query.clone();
            async move { query.fetch().await }
        });
        while mock.call_count(HttpMethod::Get, COUNT) < 2 {
            tokio::task::yield_now().await;
        }

        let snapshot = query.snapshot();
        assert!(snapshot.is_loading);
        assert_eq!(snapshot.data.map(|c| c.count), Some(5));

        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap().count, 5);
        assert!(!query.snapshot().is_loading);
    }

    #[test]
    fn test_debug_shows_mount_state() {
        let (_mock, _clock, tab) = setup();
        let query = count_query(&tab);
        query.unmount();
        let rendered = format!("{:?}", query);
        assert!(rendered.contains("mounted: false"));
        assert!(rendered.contains(COUNT));
    }

    #[tokio::test]
    async fn test_success_hook_runs_on_network_fetch_only() {
        let (mock, _clock, tab) = setup();
        mock.set_response(HttpMethod::Get, COUNT, json!({ "count": 2 }));
        let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let query = count_query(&tab).on_success(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        query.fetch().await.unwrap();
        query.fetch().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
