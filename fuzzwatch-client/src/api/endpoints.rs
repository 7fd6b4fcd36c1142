//! Resource paths, relative to the service base URL.

use crate::query::QueryOptions;
use crate::tab::Tab;

/// Permutations change only when regenerated.
pub const PERMUTATION_OPTIONS: QueryOptions = QueryOptions::secs(300, 600);

/// Domain lists, schedules, users and settings follow the `[cache]` window.
pub fn list_options(tab: &Tab) -> QueryOptions {
    QueryOptions::from(&tab.settings().cache)
}

pub fn users() -> String {
    "/api/user".to_string()
}

pub fn user(user_id: &str) -> String {
    format!("/api/user/{}", user_id)
}

pub fn domains(user_id: &str) -> String {
    format!("/api/{}/domain", user_id)
}

pub fn permutations(user_id: &str, domain_name: &str) -> String {
    format!("/api/{}/{}/permutations", user_id, domain_name)
}

pub fn permutations_count(user_id: &str) -> String {
    format!("/api/{}/permutations-count", user_id)
}

pub fn schedules(user_id: &str) -> String {
    format!("/api/{}/schedule", user_id)
}
