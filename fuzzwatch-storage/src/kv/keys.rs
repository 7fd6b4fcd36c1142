//! Typed store keys.
//!
//! A [`StoreKey<T>`] fixes the value shape for a raw key, so a writer and a
//! reader of the same key cannot disagree on its type.

use fuzzwatch_core::{Schedule, Theme};
use std::fmt;
use std::marker::PhantomData;

pub struct StoreKey<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> StoreKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StoreKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreKey<T> {}

impl<T> fmt::Debug for StoreKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreKey").field(&self.name).finish()
    }
}

impl<T> fmt::Display for StoreKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const CURRENT_USERNAME: StoreKey<String> = StoreKey::new("currentUser");
pub const CURRENT_USER_ID: StoreKey<String> = StoreKey::new("userID");
pub const DOMAIN_ROOTS: StoreKey<Vec<String>> = StoreKey::new("domainRoots");
pub const HORIZONTAL_SIDEBAR: StoreKey<bool> = StoreKey::new("horizontalSidebar");
pub const SIDEBAR_EXPANDED: StoreKey<bool> = StoreKey::new("sidebar-expanded");
pub const THEME: StoreKey<Theme> = StoreKey::new("ui-theme");
pub const DOMAIN_SCHEDULES: StoreKey<Vec<Schedule>> = StoreKey::new("domainSchedules");

/// Raw names of every well-known key.
pub const ALL_KEYS: &[&str] = &[
    CURRENT_USERNAME.name(),
    CURRENT_USER_ID.name(),
    DOMAIN_ROOTS.name(),
    HORIZONTAL_SIDEBAR.name(),
    SIDEBAR_EXPANDED.name(),
    THEME.name(),
    DOMAIN_SCHEDULES.name(),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_are_unique() {
        let mut names = ALL_KEYS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_KEYS.len());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(THEME.to_string(), "ui-theme");
        assert_eq!(format!("{:?}", DOMAIN_ROOTS), "StoreKey(\"domainRoots\")");
    }
}
