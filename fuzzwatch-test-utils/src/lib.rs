//! fuzzwatch Test Utilities
//!
//! Shared test infrastructure for the fuzzwatch workspace:
//! - A scripted [`MockTransport`] standing in for the scanning service
//! - Proptest generators for records and domain names
//! - Fixtures for common service payloads
//! - Assertions on client errors

pub use fuzzwatch_core::{
    ApiRequest, ClientError, Domain, DomainsResponse, HttpMethod, Identity, ManualClock,
    Schedule, SharedTransport, TabId, Theme, Transport,
};
pub use fuzzwatch_events::{CrossTabChannel, EventBus};
pub use fuzzwatch_storage::{MemoryBackend, PersistedStore};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

type Route = (HttpMethod, String);

#[derive(Debug, Default)]
struct MockState {
    queued: HashMap<Route, VecDeque<Result<Value, ClientError>>>,
    fixed: HashMap<Route, Result<Value, ClientError>>,
    gates: HashMap<Route, Arc<Notify>>,
    calls: Vec<ApiRequest>,
}

/// Scripted [`Transport`].
///
/// Responses are looked up by `(method, path)`: queued responses are consumed
/// first, then the fixed response, then a 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer every `(method, path)` request with `response`.
    pub fn set_response(&self, method: HttpMethod, path: &str, response: Value) {
        self.state()
            .fixed
            .insert((method, path.to_string()), Ok(response));
    }

    /// Fail every `(method, path)` request with `error`.
    pub fn set_error(&self, method: HttpMethod, path: &str, error: ClientError) {
        self.state()
            .fixed
            .insert((method, path.to_string()), Err(error));
    }

    /// Answer the next `(method, path)` request with `response`, ahead of the
    /// fixed one.
    pub fn push_response(&self, method: HttpMethod, path: &str, response: Value) {
        self.state()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Ok(response));
    }

    pub fn push_error(&self, method: HttpMethod, path: &str, error: ClientError) {
        self.state()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Err(error));
    }

    /// Hold every `(method, path)` request until the returned gate is
    /// notified once per held request.
    pub fn hold(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state()
            .gates
            .insert((method, path.to_string()), Arc::clone(&gate));
        gate
    }

    pub fn release(&self, method: HttpMethod, path: &str) {
        self.state().gates.remove(&(method, path.to_string()));
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, method: HttpMethod, path: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    pub fn last_call(&self) -> Option<ApiRequest> {
        self.state().calls.last().cloned()
    }

    fn respond(&self, route: &Route) -> Result<Value, ClientError> {
        let mut state = self.state();
        if let Some(next) = state.queued.get_mut(route).and_then(VecDeque::pop_front) {
            return next;
        }
        match state.fixed.get(route) {
            Some(response) => response.clone(),
            None => Err(ClientError::Http {
                status: 404,
                message: format!("no route for {} {}", route.0, route.1),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ClientError> {
        let route = (request.method, request.path.clone());
        let gate = {
            let mut state = self.state();
            state.calls.push(request);
            state.gates.get(&route).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.respond(&route)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for fuzzwatch records.

    use super::*;
    use proptest::prelude::*;

    /// A syntactically valid root domain such as `abc-1.example.org`.
    pub fn arb_domain_name() -> impl Strategy<Value = String> {
        (
            prop::collection::vec("[a-z0-9]([a-z0-9-]{0,8}[a-z0-9])?", 1..3),
            prop::sample::select(vec!["com", "org", "net", "io", "co.uk"]),
        )
            .prop_map(|(labels, tld)| format!("{}.{}", labels.join("."), tld))
    }

    pub fn arb_theme() -> impl Strategy<Value = Theme> {
        prop::sample::select(Theme::all().to_vec())
    }

    pub fn arb_identity() -> impl Strategy<Value = Identity> {
        ("[a-z][a-z0-9_]{0,15}", "[a-f0-9]{8}").prop_map(|(name, id)| Identity::new(name, id))
    }

    pub fn arb_schedule() -> impl Strategy<Value = Schedule> {
        (
            "[a-f0-9]{8}",
            "[A-Za-z ]{0,20}",
            arb_domain_name(),
            prop::option::of(0u32..720),
        )
            .prop_map(|(id, name, domain, hours)| Schedule {
                schedule_id: id,
                schedule_name: name,
                domain_name: domain,
                start_date: "2026-01-01T00:00:00Z".to_string(),
                next_scan: hours.map(|h| {
                    chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                        .map(|start| start + chrono::Duration::hours(i64::from(h)))
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default()
                }),
            })
    }

    /// Schedules with pairwise distinct ids.
    pub fn arb_schedules(max: usize) -> impl Strategy<Value = Vec<Schedule>> {
        prop::collection::vec(arb_schedule(), 0..max).prop_map(|mut schedules| {
            let mut seen = std::collections::HashSet::new();
            schedules.retain(|s| seen.insert(s.schedule_id.clone()));
            schedules
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Service payloads and records for common scenarios.

    use super::*;
    use serde_json::json;

    pub const USER_ID: &str = "u-1";
    pub const USERNAME: &str = "alice";

    pub fn identity() -> Identity {
        Identity::new(USERNAME, USER_ID)
    }

    /// Body of `GET /api/{user}/domain` listing `names`.
    pub fn domains_response(names: &[&str]) -> Value {
        let domains: Vec<Value> = names
            .iter()
            .map(|name| json!({ "domain_name": name, "user_id": USER_ID, "total_scans": 0 }))
            .collect();
        json!({
            "domains": domains,
            "user_risk_counts": { "high": 0, "medium": 0, "low": 0, "unknown": 0 }
        })
    }

    pub fn create_domain_response(name: &str) -> Value {
        json!({ "message": "Domain added", "domain_name": name })
    }

    pub fn schedule(id: &str, domain: &str) -> Schedule {
        Schedule {
            schedule_id: id.to_string(),
            schedule_name: format!("{} scan", domain),
            domain_name: domain.to_string(),
            start_date: "2026-01-01T00:00:00Z".to_string(),
            next_scan: Some("2026-01-02T00:00:00Z".to_string()),
        }
    }

    pub fn schedules_response(schedules: &[Schedule]) -> Value {
        json!({ "schedules": schedules })
    }

    pub fn users_response(users: &[(&str, &str)]) -> Value {
        let users: Vec<Value> = users
            .iter()
            .map(|(id, name)| json!({ "user_id": id, "username": name }))
            .collect();
        json!({ "users": users })
    }

    pub fn permutation(name: &str, domain: &str) -> Value {
        json!({
            "permutation_name": name,
            "domain_name": domain,
            "fuzzer": "homoglyph",
            "risk": 0.42,
            "risk_level": "medium"
        })
    }

    pub fn server_error(status: u16, message: &str) -> ClientError {
        ClientError::Http {
            status,
            message: message.to_string(),
        }
    }

    /// A store on a fresh in-memory backend with its own channel.
    pub fn memory_store() -> PersistedStore {
        PersistedStore::new(MemoryBackend::shared(), CrossTabChannel::new(16), TabId::new())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on client results.

    use super::*;

    #[track_caller]
    pub fn assert_http_status<T: std::fmt::Debug>(result: &Result<T, ClientError>, status: u16) {
        match result {
            Err(ClientError::Http { status: got, .. }) if *got == status => {}
            other => panic!("Expected HTTP {} error, got: {:?}", status, other),
        }
    }

    #[track_caller]
    pub fn assert_disabled<T: std::fmt::Debug>(result: &Result<T, ClientError>, parameter: &str) {
        match result {
            Err(ClientError::Disabled { parameter: got }) if got == parameter => {}
            other => panic!("Expected query disabled on {}, got: {:?}", parameter, other),
        }
    }

    #[track_caller]
    pub fn assert_validation<T: std::fmt::Debug>(result: &Result<T, ClientError>, field: &str) {
        match result {
            Err(ClientError::Validation { field: got, .. }) if got == field => {}
            other => panic!("Expected validation error on {}, got: {:?}", field, other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_transport_queued_before_fixed() {
        let mock = MockTransport::new();
        mock.set_response(HttpMethod::Get, "/api/user", json!({ "users": [] }));
        mock.push_response(HttpMethod::Get, "/api/user", json!({ "users": [1] }));

        let first = mock.send(ApiRequest::get("/api/user")).await.unwrap();
        let second = mock.send(ApiRequest::get("/api/user")).await.unwrap();
        assert_eq!(first, json!({ "users": [1] }));
        assert_eq!(second, json!({ "users": [] }));
        assert_eq!(mock.call_count(HttpMethod::Get, "/api/user"), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_route_is_404() {
        let mock = MockTransport::new();
        let result = mock.send(ApiRequest::delete("/api/nowhere")).await;
        assertions::assert_http_status(&result, 404);
        assert_eq!(mock.last_call().map(|c| c.method), Some(HttpMethod::Delete));
    }

    #[tokio::test]
    async fn test_mock_transport_scripted_error() {
        let mock = MockTransport::new();
        mock.push_error(
            HttpMethod::Post,
            "/api/u-1/domain",
            fixtures::server_error(500, "boom"),
        );
        let result = mock.send(ApiRequest::post("/api/u-1/domain")).await;
        assertions::assert_http_status(&result, 500);
    }

    #[test]
    fn test_domains_fixture_decodes() {
        let parsed: DomainsResponse =
            serde_json::from_value(fixtures::domains_response(&["a.com", "b.org"])).unwrap();
        assert_eq!(parsed.domain_names(), vec!["a.com", "b.org"]);
    }

    proptest! {
        #[test]
        fn prop_generated_schedule_ids_are_distinct(schedules in generators::arb_schedules(12)) {
            let mut ids: Vec<_> = schedules.iter().map(|s| s.schedule_id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), schedules.len());
        }

        #[test]
        fn prop_generated_domain_names_have_a_dot(name in generators::arb_domain_name()) {
            prop_assert!(name.contains('.'));
            prop_assert!(!name.starts_with('-'));
        }
    }
}
