//! The monitored domain roots list.

use super::lock;
use crate::api::domains;
use crate::query::Query;
use crate::tab::Tab;
use fuzzwatch_core::{ClientError, DomainsResponse};
use fuzzwatch_events::{BusMessage, Subscription, Topic};
use fuzzwatch_storage::keys::DOMAIN_ROOTS;
use fuzzwatch_storage::{PersistedStore, Throttle};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Throttle name for notification-driven domain list refetches.
pub const REFETCH_DOMAINS: &str = "refetch-domains";

/// Keeps a list of domain roots current.
///
/// Roots are re-read from the persisted store as soon as a notification
/// arrives, inside the publisher's call. A network refetch is queued at most
/// once per cooldown window and performed by [`DomainListWatcher::drain`].
pub struct DomainListWatcher {
    query: Query<DomainsResponse>,
    roots: Arc<Mutex<Vec<String>>>,
    throttle: Arc<Throttle>,
    pending: Mutex<mpsc::UnboundedReceiver<()>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl DomainListWatcher {
    pub fn new(tab: &Tab, user_id: &str) -> Self {
        let query = domains::domains(tab, user_id);
        let roots = Arc::new(Mutex::new(tab.store().domain_roots()));
        let throttle = Arc::new(Throttle::new(
            REFETCH_DOMAINS,
            tab.settings().refetch_cooldown,
            Arc::clone(tab.clock()),
        ));
        let (tx, rx) = mpsc::unbounded_channel();

        let handler = {
            let store = tab.store().clone();
            let roots = Arc::clone(&roots);
            let throttle = Arc::clone(&throttle);
            move || refresh(&store, &roots, &throttle, &tx)
        };
        let handler = Arc::new(handler);

        let on_list = Arc::clone(&handler);
        let list_updated = tab
            .bus()
            .subscribe(Topic::DomainListUpdated, move |_| (*on_list)());

        let on_storage = Arc::clone(&handler);
        let storage = tab.bus().subscribe(Topic::Storage, move |message| {
            if let BusMessage::Storage(change) = message {
                if change.touches(DOMAIN_ROOTS.name()) {
                    (*on_storage)();
                }
            }
        });

        Self {
            query,
            roots,
            throttle,
            pending: Mutex::new(rx),
            subscriptions: Mutex::new(vec![list_updated, storage]),
        }
    }

    pub fn roots(&self) -> Vec<String> {
        lock(&self.roots).clone()
    }

    pub fn query(&self) -> &Query<DomainsResponse> {
        &self.query
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Initial read through the cache.
    pub async fn load(&self) -> Result<DomainsResponse, ClientError> {
        let response = self.query.fetch().await?;
        self.adopt(&response);
        Ok(response)
    }

    /// Empty the refetch queue and refetch once if anything was queued.
    /// Returns how many refetches ran.
    pub async fn drain(&self) -> usize {
        let queued = {
            let mut pending = lock(&self.pending);
            let mut count = 0;
            while pending.try_recv().is_ok() {
                count += 1;
            }
            count
        };
        if queued == 0 {
            return 0;
        }

        // Failures are recorded on the query.
        if let Ok(response) = self.query.refetch().await {
            self.adopt(&response);
        }
        1
    }

    pub fn unmount(&self) {
        lock(&self.subscriptions).clear();
        self.query.unmount();
    }

    fn adopt(&self, response: &DomainsResponse) {
        if self.query.is_mounted() {
            *lock(&self.roots) = response.domain_names();
        }
    }
}

fn refresh(
    store: &PersistedStore,
    roots: &Mutex<Vec<String>>,
    throttle: &Throttle,
    refetch: &mpsc::UnboundedSender<()>,
) {
    *lock(roots) = store.domain_roots();
    if throttle.try_acquire() {
        debug!("Queueing domain list refetch");
        // The receiver lives as long as the watcher.
        let _ = refetch.send(());
    } else {
        trace!("Domain list refetch throttled");
    }
}

impl std::fmt::Debug for DomainListWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainListWatcher")
            .field("query", &self.query)
            .field("roots", &*lock(&self.roots))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::Origin;
    use fuzzwatch_core::{HttpMethod, ManualClock};
    use fuzzwatch_test_utils::{fixtures, MockTransport};
    use std::time::Duration;

    const PATH: &str = "/api/u-1/domain";

    fn setup() -> (Arc<MockTransport>, ManualClock, Tab) {
        let mock = MockTransport::new().shared();
        let clock = ManualClock::starting_now();
        let origin = Origin::in_memory(mock.clone(), clock.shared());
        (mock, clock, origin.open_tab())
    }

    #[tokio::test]
    async fn test_load_reads_roots() {
        let (mock, _clock, tab) = setup();
        mock.set_response(HttpMethod::Get, PATH, fixtures::domains_response(&["a.com"]));
        let watcher = DomainListWatcher::new(&tab, "u-1");
        watcher.load().await.unwrap();
        assert_eq!(watcher.roots(), vec!["a.com"]);
    }

    #[tokio::test]
    async fn test_notification_rederives_synchronously() {
        let (_mock, _clock, tab) = setup();
        let watcher = DomainListWatcher::new(&tab, "u-1");
        tab.store().set_domain_roots(&["b.org".to_string()]).unwrap();
        tab.publish(BusMessage::DomainListUpdated);
        assert_eq!(watcher.roots(), vec!["b.org"]);
    }

    #[tokio::test]
    async fn test_burst_costs_one_refetch() {
        let (mock, clock, tab) = setup();
        mock.set_response(HttpMethod::Get, PATH, fixtures::domains_response(&["a.com"]));
        let watcher = DomainListWatcher::new(&tab, "u-1");

        tab.publish(BusMessage::DomainListUpdated);
        clock.advance(Duration::from_millis(500));
        tab.publish(BusMessage::DomainListUpdated);
        assert_eq!(watcher.drain().await, 1);
        assert_eq!(mock.call_count(HttpMethod::Get, PATH), 1);

        clock.advance(Duration::from_millis(2500));
        tab.publish(BusMessage::DomainListUpdated);
        assert_eq!(watcher.drain().await, 1);
        assert_eq!(mock.call_count(HttpMethod::Get, PATH), 2);
    }

    #[tokio::test]
    async fn test_requests_queued_across_windows_share_one_refetch() {
        let (mock, clock, tab) = setup();
        mock.set_response(HttpMethod::Get, PATH, fixtures::domains_response(&["a.com"]));
        let watcher = DomainListWatcher::new(&tab, "u-1");

        tab.publish(BusMessage::DomainListUpdated);
        clock.advance(Duration::from_millis(2500));
        tab.publish(BusMessage::DomainListUpdated);
        assert_eq!(watcher.drain().await, 1);
        assert_eq!(mock.call_count(HttpMethod::Get, PATH), 1);
    }

    #[tokio::test]
    async fn test_unmounted_watcher_ignores_notifications() {
        let (_mock, _clock, tab) = setup();
        let watcher = DomainListWatcher::new(&tab, "u-1");
        watcher.unmount();
        tab.store().set_domain_roots(&["c.net".to_string()]).unwrap();
        tab.publish(BusMessage::DomainListUpdated);
        assert!(watcher.roots().is_empty());
        assert_eq!(watcher.drain().await, 0);
    }
}
