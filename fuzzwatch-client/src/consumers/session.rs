//! Who is signed in on this origin.

use crate::api::users;
use crate::tab::Tab;
use fuzzwatch_core::{ClientError, Identity, StorageError};
use fuzzwatch_events::{BusMessage, StorageChange};
use tracing::{info, warn};

/// Sign-in state backed by the persisted identity keys.
///
/// Holds no state of its own, so any number of sessions on one tab agree.
#[derive(Debug, Clone)]
pub struct Session {
    tab: Tab,
}

impl Session {
    pub fn new(tab: &Tab) -> Self {
        Self { tab: tab.clone() }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tab.store().identity()
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity().is_some_and(|identity| identity.is_signed_in())
    }

    pub fn login(&self, identity: &Identity) -> Result<(), StorageError> {
        self.tab.store().set_identity(identity)?;
        info!(user_id = %identity.user_id, "Signed in");
        self.announce();
        Ok(())
    }

    /// Forget the identity and every cached response of this tab.
    pub fn logout(&self) -> Result<(), StorageError> {
        let cleared = self.tab.store().clear_identity();
        let dropped = self.tab.cache().clear();
        info!(dropped, "Signed out");
        self.announce();
        cleared
    }

    /// Check the stored identity against the service's user list.
    ///
    /// An identity the service no longer knows is forgotten. A listing that
    /// fails leaves the decision to the users query.
    pub async fn restore(&self) -> Result<Option<Identity>, ClientError> {
        let Some(stored) = self.identity() else {
            return Ok(None);
        };

        let listing = users::users(&self.tab).fetch().await?;
        match listing.users.iter().find(|user| user.user_id == stored.user_id) {
            Some(user) => {
                let current = Identity::new(&user.username, &user.user_id);
                if current != stored {
                    let _ = self.tab.store().set_username(&user.username);
                    self.announce();
                }
                Ok(Some(current))
            }
            None => {
                warn!(user_id = %stored.user_id, "Stored user unknown to the service");
                let _ = self.tab.store().clear_identity();
                self.announce();
                Ok(None)
            }
        }
    }

    fn announce(&self) {
        self.tab.publish(BusMessage::UserUpdated);
        self.tab
            .publish(BusMessage::Storage(StorageChange::from_source(self.tab.id())));
    }
}
