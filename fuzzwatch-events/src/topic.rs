//! Topics and their payloads.

use fuzzwatch_core::{TabId, Theme};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload-free discriminant of [`BusMessage`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Something in the persisted store changed. Subscribers re-derive.
    Storage,
    DomainListUpdated,
    SchedulesUpdated,
    UserUpdated,
    SidebarLayoutChanged,
    SidebarToggled,
    ContentPaddingChanged,
    ThemeChanged,
}

impl Topic {
    /// Wire name of the topic, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Topic::Storage => "storage",
            Topic::DomainListUpdated => "domain-list-updated",
            Topic::SchedulesUpdated => "schedules-updated",
            Topic::UserUpdated => "user-updated",
            Topic::SidebarLayoutChanged => "sidebar-layout-changed",
            Topic::SidebarToggled => "sidebar-toggle",
            Topic::ContentPaddingChanged => "content-padding-changed",
            Topic::ThemeChanged => "theme-changed",
        }
    }

    pub fn all() -> &'static [Topic] {
        &[
            Topic::Storage,
            Topic::DomainListUpdated,
            Topic::SchedulesUpdated,
            Topic::UserUpdated,
            Topic::SidebarLayoutChanged,
            Topic::SidebarToggled,
            Topic::ContentPaddingChanged,
            Topic::ThemeChanged,
        ]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Notice that the persisted store was mutated.
///
/// `key` names the changed key when known. `None` means "anything may have
/// changed": a cleared store, an explicit generic signal, or several coalesced
/// notifications. Receivers must treat the key as a hint only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: Option<String>,
    pub source: Option<TabId>,
}

impl StorageChange {
    pub fn for_key(key: impl Into<String>, source: TabId) -> Self {
        Self {
            key: Some(key.into()),
            source: Some(source),
        }
    }

    /// A keyless, sourceless "anything changed" signal.
    pub fn any() -> Self {
        Self {
            key: None,
            source: None,
        }
    }

    pub fn from_source(source: TabId) -> Self {
        Self {
            key: None,
            source: Some(source),
        }
    }

    /// Whether a consumer of `key` should re-derive.
    pub fn touches(&self, key: &str) -> bool {
        match &self.key {
            Some(changed) => changed == key,
            None => true,
        }
    }
}

/// Every message that can travel on the bus, one variant per topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum BusMessage {
    Storage(StorageChange),
    DomainListUpdated,
    SchedulesUpdated,
    UserUpdated,
    SidebarLayoutChanged { enabled: bool },
    SidebarToggled { expanded: bool },
    ContentPaddingChanged { left: u32, right: u32 },
    ThemeChanged { theme: Theme },
}

impl BusMessage {
    pub fn topic(&self) -> Topic {
        match self {
            BusMessage::Storage(_) => Topic::Storage,
            BusMessage::DomainListUpdated => Topic::DomainListUpdated,
            BusMessage::SchedulesUpdated => Topic::SchedulesUpdated,
            BusMessage::UserUpdated => Topic::UserUpdated,
            BusMessage::SidebarLayoutChanged { .. } => Topic::SidebarLayoutChanged,
            BusMessage::SidebarToggled { .. } => Topic::SidebarToggled,
            BusMessage::ContentPaddingChanged { .. } => Topic::ContentPaddingChanged,
            BusMessage::ThemeChanged { .. } => Topic::ThemeChanged,
        }
    }

    /// Generic same-tab "storage changed" signal.
    pub fn storage_any() -> Self {
        BusMessage::Storage(StorageChange::any())
    }
}
