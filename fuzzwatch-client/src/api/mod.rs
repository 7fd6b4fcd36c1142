//! The scanning service's resources, expressed through [`Query`] and
//! [`Mutation`].
//!
//! Every function takes the user id explicitly. Reads are disabled while it is
//! blank; writes refuse with [`ClientError::NotLoggedIn`] before touching the
//! network.
//!
//! [`Query`]: crate::query::Query
//! [`Mutation`]: crate::mutation::Mutation
//! [`ClientError::NotLoggedIn`]: fuzzwatch_core::ClientError::NotLoggedIn

pub mod domains;
pub mod endpoints;
pub mod permutations;
pub mod schedules;
pub mod users;

use fuzzwatch_core::ClientError;

pub(crate) fn require_user(user_id: &str) -> Result<&str, ClientError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        Err(ClientError::NotLoggedIn)
    } else {
        Ok(trimmed)
    }
}

/// Same-tab "storage changed" signal for one persisted key.
pub(crate) fn storage_changed(tab: &crate::tab::Tab, key: &str) -> fuzzwatch_events::BusMessage {
    fuzzwatch_events::BusMessage::Storage(fuzzwatch_events::StorageChange::for_key(key, tab.id()))
}

/// Raise a rejected input the way a failed write is raised, and hand it back.
pub(crate) fn reject(tab: &crate::tab::Tab, error: ClientError) -> ClientError {
    let description = match &error {
        ClientError::Validation { reason, .. } => reason.clone(),
        other => other.to_string(),
    };
    tab.notifications().error("Error", Some(description));
    error
}
