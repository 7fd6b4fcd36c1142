//! User-visible notifications raised by mutations.
//!
//! The rendering side drains the center; this layer only records what would
//! be shown.

use fuzzwatch_core::{SharedClock, Timestamp};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            created_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Per-tab notification queue.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    queue: Arc<Mutex<Vec<Notification>>>,
    clock: SharedClock,
}

impl NotificationCenter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }

    fn queue(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, notification: Notification) {
        self.queue().push(notification);
    }

    pub fn notify(&self, level: NotificationLevel, title: &str, description: Option<String>) {
        let mut notification = Notification::new(level, title, self.clock.now());
        notification.description = description;
        self.push(notification);
    }

    pub fn success(&self, title: &str, description: Option<String>) {
        self.notify(NotificationLevel::Success, title, description);
    }

    pub fn error(&self, title: &str, description: Option<String>) {
        self.notify(NotificationLevel::Error, title, description);
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.queue())
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.queue().clone()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.queue().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}
