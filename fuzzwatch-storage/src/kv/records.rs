//! Typed accessors for the well-known records.

use super::keys::{
    CURRENT_USERNAME, CURRENT_USER_ID, DOMAIN_ROOTS, DOMAIN_SCHEDULES, HORIZONTAL_SIDEBAR,
    SIDEBAR_EXPANDED, THEME,
};
use super::store::PersistedStore;
use fuzzwatch_core::{Identity, Schedule, StorageError, Theme};

impl PersistedStore {
    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// The remembered user, if a non-blank user id is stored.
    pub fn identity(&self) -> Option<Identity> {
        let user_id = self.get(&CURRENT_USER_ID)?;
        let identity = Identity::new(self.get_or_default(&CURRENT_USERNAME), user_id);
        identity.is_signed_in().then_some(identity)
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.identity().map(|identity| identity.user_id)
    }

    pub fn set_identity(&self, identity: &Identity) -> Result<(), StorageError> {
        self.set(&CURRENT_USERNAME, &identity.username)?;
        self.set(&CURRENT_USER_ID, &identity.user_id)
    }

    pub fn set_username(&self, username: &str) -> Result<(), StorageError> {
        self.set(&CURRENT_USERNAME, &username.to_string())
    }

    /// Forget the signed-in user. Both keys are attempted even if one fails.
    pub fn clear_identity(&self) -> Result<(), StorageError> {
        let username = self.remove(&CURRENT_USERNAME);
        let user_id = self.remove(&CURRENT_USER_ID);
        username.and(user_id)
    }

    // ------------------------------------------------------------------------
    // Domain roots
    // ------------------------------------------------------------------------

    pub fn domain_roots(&self) -> Vec<String> {
        self.get_or_default(&DOMAIN_ROOTS)
    }

    pub fn set_domain_roots(&self, roots: &[String]) -> Result<(), StorageError> {
        self.set(&DOMAIN_ROOTS, &roots.to_vec())
    }

    /// Append `root` unless it is already known. Returns whether it was added.
    pub fn add_domain_root(&self, root: &str) -> Result<bool, StorageError> {
        let mut roots = self.domain_roots();
        if roots.iter().any(|r| r == root) {
            return Ok(false);
        }
        roots.push(root.to_string());
        self.set(&DOMAIN_ROOTS, &roots)?;
        Ok(true)
    }

    /// Drop `root` if present. Returns whether it was removed.
    pub fn remove_domain_root(&self, root: &str) -> Result<bool, StorageError> {
        let mut roots = self.domain_roots();
        let before = roots.len();
        roots.retain(|r| r != root);
        if roots.len() == before {
            return Ok(false);
        }
        self.set(&DOMAIN_ROOTS, &roots)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Schedules
    // ------------------------------------------------------------------------

    pub fn schedules(&self) -> Vec<Schedule> {
        self.get_or_default(&DOMAIN_SCHEDULES)
    }

    pub fn set_schedules(&self, schedules: &[Schedule]) -> Result<(), StorageError> {
        self.set(&DOMAIN_SCHEDULES, &schedules.to_vec())
    }

    /// Insert or replace schedules by `schedule_id`, keeping stored order.
    pub fn upsert_schedules(&self, incoming: &[Schedule]) -> Result<(), StorageError> {
        let mut schedules = self.schedules();
        for schedule in incoming {
            match schedules
                .iter_mut()
                .find(|s| s.schedule_id == schedule.schedule_id)
            {
                Some(existing) => *existing = schedule.clone(),
                None => schedules.push(schedule.clone()),
            }
        }
        self.set(&DOMAIN_SCHEDULES, &schedules)
    }

    pub fn remove_schedules(&self, schedule_ids: &[String]) -> Result<(), StorageError> {
        let mut schedules = self.schedules();
        schedules.retain(|s| !schedule_ids.contains(&s.schedule_id));
        self.set(&DOMAIN_SCHEDULES, &schedules)
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    /// Stored theme, `System` when absent or unreadable.
    pub fn theme(&self) -> Theme {
        self.get_or_default(&THEME)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.set(&THEME, &theme)
    }

    pub fn horizontal_sidebar(&self) -> bool {
        self.get_or(&HORIZONTAL_SIDEBAR, false)
    }

    pub fn set_horizontal_sidebar(&self, enabled: bool) -> Result<(), StorageError> {
        self.set(&HORIZONTAL_SIDEBAR, &enabled)
    }

    pub fn sidebar_expanded(&self) -> bool {
        self.get_or(&SIDEBAR_EXPANDED, false)
    }

    pub fn set_sidebar_expanded(&self, expanded: bool) -> Result<(), StorageError> {
        self.set(&SIDEBAR_EXPANDED, &expanded)
    }
}

#[cfg(test)]
mod tests {
    use crate::kv::backend::MemoryBackend;
    use crate::kv::store::PersistedStore;
    use fuzzwatch_core::{Identity, Schedule, TabId, Theme};
    use fuzzwatch_events::CrossTabChannel;

    fn store() -> PersistedStore {
        PersistedStore::new(MemoryBackend::shared(), CrossTabChannel::new(8), TabId::new())
    }

    fn schedule(id: &str, name: &str) -> Schedule {
        Schedule {
            schedule_id: id.to_string(),
            schedule_name: name.to_string(),
            domain_name: "example.com".to_string(),
            start_date: "2026-01-01T00:00:00Z".to_string(),
            next_scan: None,
        }
    }

    #[test]
    fn test_identity_roundtrip_and_clear() {
        let store = store();
        assert_eq!(store.identity(), None);

        store.set_identity(&Identity::new("alice", "u-1")).unwrap();
        assert_eq!(store.identity(), Some(Identity::new("alice", "u-1")));
        assert_eq!(store.current_user_id().as_deref(), Some("u-1"));

        store.clear_identity().unwrap();
        assert_eq!(store.identity(), None);
    }

    #[test]
    fn test_blank_user_id_is_signed_out() {
        let store = store();
        store.set_identity(&Identity::new("alice", "")).unwrap();
        assert_eq!(store.identity(), None);
    }

    #[test]
    fn test_domain_roots_add_is_idempotent() {
        let store = store();
        assert!(store.add_domain_root("example.com").unwrap());
        assert!(!store.add_domain_root("example.com").unwrap());
        assert_eq!(store.domain_roots(), vec!["example.com".to_string()]);

        assert!(store.remove_domain_root("example.com").unwrap());
        assert!(!store.remove_domain_root("example.com").unwrap());
        assert!(store.domain_roots().is_empty());
    }

    #[test]
    fn test_upsert_and_remove_schedules() {
        let store = store();
        store
            .set_schedules(&[schedule("s1", "daily"), schedule("s2", "weekly")])
            .unwrap();
        store
            .upsert_schedules(&[schedule("s2", "hourly"), schedule("s3", "monthly")])
            .unwrap();

        let names: Vec<String> = store.schedules().into_iter().map(|s| s.schedule_name).collect();
        assert_eq!(names, vec!["daily", "hourly", "monthly"]);

        store.remove_schedules(&["s1".to_string()]).unwrap();
        assert_eq!(store.schedules().len(), 2);
    }

    #[test]
    fn test_preference_defaults() {
        let store = store();
        assert_eq!(store.theme(), Theme::System);
        assert!(!store.horizontal_sidebar());
        assert!(!store.sidebar_expanded());

        store.set_theme(Theme::Dark).unwrap();
        store.set_horizontal_sidebar(true).unwrap();
        store.set_sidebar_expanded(true).unwrap();
        assert_eq!(store.theme(), Theme::Dark);
        assert!(store.horizontal_sidebar());
        assert!(store.sidebar_expanded());
    }
}
