//! Writes and their side effects.
//!
//! On success a [`Mutation`] applies its effects in a fixed order: invalidate
//! cache entries, mirror into the persisted store, publish bus messages, then
//! raise the success notification. Mirroring before publishing means
//! subscribers re-reading the store see the new value. On failure nothing is
//! invalidated, mirrored or published; the error is returned and raised as an
//! error notification.

use crate::tab::Tab;
use fuzzwatch_core::{ApiRequest, ClientError, StorageError};
use fuzzwatch_events::BusMessage;
use fuzzwatch_storage::{InvalidationPattern, PersistedStore};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

type Mirror<T> = Box<dyn FnOnce(&T, &PersistedStore) -> Result<(), StorageError> + Send>;
type Describe<T> = Box<dyn FnOnce(&T) -> String + Send>;

/// One write against the service.
pub struct Mutation<T> {
    label: &'static str,
    request: ApiRequest,
    invalidates: Vec<InvalidationPattern>,
    publishes: Vec<BusMessage>,
    mirror: Option<Mirror<T>>,
    success_title: Option<String>,
    describe: Option<Describe<T>>,
    error_title: String,
}

impl<T: DeserializeOwned> Mutation<T> {
    pub fn new(label: &'static str, request: ApiRequest) -> Self {
        Self {
            label,
            request,
            invalidates: Vec::new(),
            publishes: Vec::new(),
            mirror: None,
            success_title: None,
            describe: None,
            error_title: format!("Error {}", label),
        }
    }

    pub fn invalidates(mut self, pattern: InvalidationPattern) -> Self {
        self.invalidates.push(pattern);
        self
    }

    pub fn publishes(mut self, message: BusMessage) -> Self {
        self.publishes.push(message);
        self
    }

    pub fn mirror<F>(mut self, mirror: F) -> Self
    where
        F: FnOnce(&T, &PersistedStore) -> Result<(), StorageError> + Send + 'static,
    {
        self.mirror = Some(Box::new(mirror));
        self
    }

    pub fn success(mut self, title: impl Into<String>) -> Self {
        self.success_title = Some(title.into());
        self
    }

    /// Build the success notification's description from the response.
    pub fn describe<F>(mut self, describe: F) -> Self
    where
        F: FnOnce(&T) -> String + Send + 'static,
    {
        self.describe = Some(Box::new(describe));
        self
    }

    pub fn error_title(mut self, title: impl Into<String>) -> Self {
        self.error_title = title.into();
        self
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub async fn run(self, tab: &Tab) -> Result<T, ClientError> {
        info!(operation = self.label, request = %self.request, "Mutation");
        let response = match tab.transport().send(self.request).await {
            Ok(value) => T::deserialize(&value).map_err(ClientError::from),
            Err(error) => Err(error),
        };

        let response = match response {
            Ok(response) => response,
            Err(error) => {
                warn!(operation = self.label, error = %error, "Mutation failed");
                tab.notifications()
                    .error(&self.error_title, Some(error.to_string()));
                return Err(error);
            }
        };

        let removed: usize = self
            .invalidates
            .iter()
            .map(|pattern| tab.cache().invalidate(pattern))
            .sum();
        debug!(operation = self.label, removed, "Invalidated after mutation");

        if let Some(mirror) = self.mirror {
            // The store already logged the failure; the write itself stands.
            if let Err(error) = mirror(&response, tab.store()) {
                debug!(operation = self.label, error = %error, "Mirror skipped");
            }
        }

        for message in self.publishes {
            tab.publish(message);
        }

        if let Some(title) = &self.success_title {
            let description = self.describe.map(|describe| describe(&response));
            tab.notifications().success(title, description);
        }
        Ok(response)
    }
}
