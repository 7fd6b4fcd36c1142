//! Cross-tab storage signalling.
//!
//! All tabs of one origin share a [`CrossTabChannel`]. A write to the
//! persisted store signals the channel with the writing tab's id; every other
//! tab's [`CrossTabListener`] republishes the notice on its own bus as a
//! [`BusMessage::Storage`]. The writer never hears its own signal.

use crate::bus::EventBus;
use crate::topic::{BusMessage, StorageChange};
use fuzzwatch_core::TabId;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Buffered notices per listener before a slow tab starts lagging.
pub const DEFAULT_CROSS_TAB_CAPACITY: usize = 256;

/// Origin-wide broadcast of storage changes.
#[derive(Debug, Clone)]
pub struct CrossTabChannel {
    tx: broadcast::Sender<StorageChange>,
}

impl CrossTabChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Announce a storage change to every attached tab.
    ///
    /// Never blocks. With no other tab attached the notice is dropped.
    pub fn signal(&self, change: StorageChange) {
        let key = change.key.clone();
        match self.tx.send(change) {
            Ok(receivers) => {
                debug!(key = ?key, receivers, "Signalled storage change");
            }
            Err(_) => {
                debug!(key = ?key, "No tabs attached for storage change");
            }
        }
    }

    /// Attach a tab. Only notices signalled after this call are delivered.
    pub fn attach(&self, tab: TabId, bus: EventBus) -> CrossTabListener {
        CrossTabListener {
            tab,
            rx: self.tx.subscribe(),
            bus,
        }
    }

    pub fn attached_tabs(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for CrossTabChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CROSS_TAB_CAPACITY)
    }
}

/// A tab's receiving end of the [`CrossTabChannel`].
#[derive(Debug)]
pub struct CrossTabListener {
    tab: TabId,
    rx: broadcast::Receiver<StorageChange>,
    bus: EventBus,
}

impl CrossTabListener {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Deliver every notice already waiting, then return.
    ///
    /// Returns the number of messages published on this tab's bus. Notices
    /// lost to lag collapse into a single keyless `Storage` message.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            match self.rx.try_recv() {
                Ok(change) => {
                    if self.deliver(change) {
                        delivered += 1;
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    self.coalesce(missed);
                    delivered += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        delivered
    }

    /// Deliver notices as they arrive until the channel closes.
    pub async fn run(mut self) {
        loop {
            match self.rx.recv().await {
                Ok(change) => {
                    self.deliver(change);
                }
                Err(RecvError::Lagged(missed)) => self.coalesce(missed),
                Err(RecvError::Closed) => {
                    debug!(tab = %self.tab, "Cross-tab channel closed");
                    break;
                }
            }
        }
    }

    /// Run the listener on the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn deliver(&self, change: StorageChange) -> bool {
        if change.source == Some(self.tab) {
            return false;
        }
        self.bus.publish(BusMessage::Storage(change));
        true
    }

    fn coalesce(&self, missed: u64) {
        warn!(tab = %self.tab, missed, "Cross-tab listener lagged, coalescing");
        self.bus.publish(BusMessage::storage_any());
    }
}
