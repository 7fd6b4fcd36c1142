//! Sidebar and content layout.
//!
//! The sidebar, the header and the main content area each hold a
//! [`LayoutState`]; toggling in one is seen by the others through the bus.

use super::lock;
use crate::tab::Tab;
use fuzzwatch_core::{SidebarMode, StorageError};
use fuzzwatch_events::{BusMessage, StorageChange, Subscription, Topic};
use fuzzwatch_storage::keys::{HORIZONTAL_SIDEBAR, SIDEBAR_EXPANDED};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const EXPANDED_SIDEBAR_WIDTH: u32 = 256;
pub const COLLAPSED_SIDEBAR_WIDTH: u32 = 64;
/// Viewports narrower than this are laid out for mobile.
pub const MOBILE_BREAKPOINT: u32 = 768;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentPadding {
    pub left: u32,
    pub right: u32,
}

/// Derived layout for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub mode: SidebarMode,
    pub sidebar_expanded: bool,
    pub is_mobile: bool,
    pub sidebar_width: u32,
    pub content_margin_left: u32,
    pub padding: ContentPadding,
}

#[derive(Debug, Clone, Copy)]
struct Inputs {
    expanded: bool,
    horizontal: bool,
    mobile: bool,
    padding: ContentPadding,
}

impl Inputs {
    fn snapshot(&self) -> LayoutSnapshot {
        let mode = if self.mobile {
            SidebarMode::Horizontal
        } else {
            SidebarMode::from_horizontal(self.horizontal)
        };
        let sidebar_width = match (self.mobile, self.expanded) {
            (true, _) => 0,
            (false, true) => EXPANDED_SIDEBAR_WIDTH,
            (false, false) => COLLAPSED_SIDEBAR_WIDTH,
        };
        let content_margin_left = if mode == SidebarMode::Horizontal {
            0
        } else {
            sidebar_width
        };
        LayoutSnapshot {
            mode,
            sidebar_expanded: self.expanded,
            is_mobile: self.mobile,
            sidebar_width,
            content_margin_left,
            padding: self.padding,
        }
    }
}

#[derive(Debug)]
pub struct LayoutState {
    tab: Tab,
    inputs: Arc<Mutex<Inputs>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl LayoutState {
    pub fn new(tab: &Tab, viewport_width: u32) -> Self {
        let store = tab.store();
        let inputs = Arc::new(Mutex::new(Inputs {
            expanded: store.sidebar_expanded(),
            horizontal: store.horizontal_sidebar(),
            mobile: viewport_width < MOBILE_BREAKPOINT,
            padding: ContentPadding::default(),
        }));

        let mut subscriptions = Vec::with_capacity(4);

        let sink = Arc::clone(&inputs);
        subscriptions.push(tab.bus().subscribe(Topic::SidebarToggled, move |message| {
            if let BusMessage::SidebarToggled { expanded } = message {
                // Mobile hides the sidebar at render time; the flag still
                // follows so widening the viewport shows the toggled state.
                lock(&sink).expanded = *expanded;
            }
        }));

        let sink = Arc::clone(&inputs);
        subscriptions.push(tab.bus().subscribe(Topic::SidebarLayoutChanged, move |message| {
            if let BusMessage::SidebarLayoutChanged { enabled } = message {
                lock(&sink).horizontal = *enabled;
            }
        }));

        let sink = Arc::clone(&inputs);
        subscriptions.push(tab.bus().subscribe(Topic::ContentPaddingChanged, move |message| {
            if let BusMessage::ContentPaddingChanged { left, right } = message {
                lock(&sink).padding = ContentPadding {
                    left: *left,
                    right: *right,
                };
            }
        }));

        let sink = Arc::clone(&inputs);
        let reader = store.clone();
        subscriptions.push(tab.bus().subscribe(Topic::Storage, move |message| {
            if let BusMessage::Storage(change) = message {
                let touches_expanded = change.touches(SIDEBAR_EXPANDED.name());
                let touches_horizontal = change.touches(HORIZONTAL_SIDEBAR.name());
                if !touches_expanded && !touches_horizontal {
                    return;
                }
                let mut inputs = lock(&sink);
                if touches_expanded {
                    inputs.expanded = reader.sidebar_expanded();
                }
                if touches_horizontal {
                    inputs.horizontal = reader.horizontal_sidebar();
                }
            }
        }));

        Self {
            tab: tab.clone(),
            inputs,
            subscriptions: Mutex::new(subscriptions),
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        lock(&self.inputs).snapshot()
    }

    /// Flip the sidebar between expanded and collapsed, persist it and
    /// notify the tab. Returns the new expanded flag.
    pub fn toggle_sidebar(&self) -> bool {
        let expanded = !lock(&self.inputs).expanded;
        // A failed write leaves the toggle local to this tab.
        if let Err(error) = self.tab.store().set_sidebar_expanded(expanded) {
            debug!(expanded, error = %error, "Sidebar flag not persisted");
        }
        debug!(expanded, "Sidebar toggled");
        self.tab.publish(BusMessage::SidebarToggled { expanded });
        expanded
    }

    /// Switch between the floating and the horizontal sidebar.
    pub fn set_horizontal(&self, enabled: bool) -> Result<(), StorageError> {
        let persisted = self.tab.store().set_horizontal_sidebar(enabled);
        self.tab.publish(BusMessage::SidebarLayoutChanged { enabled });
        if persisted.is_ok() {
            self.tab.publish(BusMessage::Storage(StorageChange::for_key(
                HORIZONTAL_SIDEBAR.name(),
                self.tab.id(),
            )));
        }
        persisted
    }

    /// Content padding is transient and never persisted.
    pub fn set_padding(&self, left: u32, right: u32) {
        self.tab
            .publish(BusMessage::ContentPaddingChanged { left, right });
    }

    /// Viewport changed size.
    pub fn resize(&self, viewport_width: u32) -> LayoutSnapshot {
        let mut inputs = lock(&self.inputs);
        inputs.mobile = viewport_width < MOBILE_BREAKPOINT;
        inputs.snapshot()
    }

    pub fn unmount(&self) {
        lock(&self.subscriptions).clear();
    }
}
