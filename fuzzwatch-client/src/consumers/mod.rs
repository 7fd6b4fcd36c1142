//! Sibling consumers.
//!
//! Each consumer owns its subscriptions and re-derives its view from the
//! persisted store (or a query) when notified. Consumers never reference
//! each other; two of them stay in step only through the tab's bus and the
//! store they share.

mod domain_list;
mod layout;
mod persisted_view;
mod session;
mod theme;

pub use domain_list::{DomainListWatcher, REFETCH_DOMAINS};
pub use layout::{
    ContentPadding, LayoutSnapshot, LayoutState, COLLAPSED_SIDEBAR_WIDTH,
    EXPANDED_SIDEBAR_WIDTH, MOBILE_BREAKPOINT,
};
pub use persisted_view::PersistedView;
pub use session::Session;
pub use theme::ThemeState;

use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
