use super::lock;
use crate::tab::Tab;
use fuzzwatch_core::{StorageError, Theme};
use fuzzwatch_events::{BusMessage, StorageChange, Subscription, Topic};
use fuzzwatch_storage::keys::THEME;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The tab's colour scheme preference.
///
/// Follows `ThemeChanged` from the same tab and `Storage` changes touching
/// `ui-theme` from any tab.
#[derive(Debug)]
pub struct ThemeState {
    tab: Tab,
    theme: Arc<Mutex<Theme>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ThemeState {
    pub fn new(tab: &Tab) -> Self {
        let theme = Arc::new(Mutex::new(tab.store().theme()));

        let sink = Arc::clone(&theme);
        let on_change = tab.bus().subscribe(Topic::ThemeChanged, move |message| {
            if let BusMessage::ThemeChanged { theme } = message {
                *lock(&sink) = *theme;
            }
        });

        let sink = Arc::clone(&theme);
        let store = tab.store().clone();
        let on_storage = tab.bus().subscribe(Topic::Storage, move |message| {
            if let BusMessage::Storage(change) = message {
                if change.touches(THEME.name()) {
                    *lock(&sink) = store.theme();
                }
            }
        });

        Self {
            tab: tab.clone(),
            theme,
            subscriptions: Mutex::new(vec![on_change, on_storage]),
        }
    }

    pub fn theme(&self) -> Theme {
        *lock(&self.theme)
    }

    /// The concrete scheme to render.
    pub fn resolved(&self, platform_prefers_dark: bool) -> Theme {
        self.theme().resolve(platform_prefers_dark)
    }

    /// Persist `theme` and tell the rest of the tab.
    ///
    /// A failed write still applies the theme to this tab's consumers; the
    /// error is returned so callers can surface it.
    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        debug!(theme = %theme, "Setting theme");
        let persisted = self.tab.store().set_theme(theme);
        self.tab.publish(BusMessage::ThemeChanged { theme });
        if persisted.is_ok() {
            self.tab.publish(BusMessage::Storage(StorageChange::for_key(
                THEME.name(),
                self.tab.id(),
            )));
        }
        persisted
    }

    pub fn unmount(&self) {
        lock(&self.subscriptions).clear();
    }
}
