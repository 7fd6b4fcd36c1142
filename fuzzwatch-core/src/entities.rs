//! Records exchanged with the scanning service and kept in the persisted store.
//!
//! Field names follow the service's JSON exactly. Optional fields default when
//! absent so older service builds still decode.

use crate::enums::{RiskLevel, Theme};
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY
// ============================================================================

/// The signed-in user as remembered by the persisted store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub user_id: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: user_id.into(),
        }
    }

    /// A user id is required for every per-user resource.
    pub fn is_signed_in(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Response to creating a user or renaming one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    #[serde(default)]
    pub message: String,
    pub username: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub horizontal_sidebar: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateUserSettingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_sidebar: Option<bool>,
}

// ============================================================================
// DOMAINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskCounts {
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub unknown: u64,
}

impl RiskCounts {
    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low + self.unknown
    }
}

/// A monitored root domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub last_scan: Option<String>,
    #[serde(default)]
    pub total_scans: u64,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub mail_server: Option<String>,
    #[serde(default)]
    pub risk_counts: Option<RiskCounts>,
}

impl Domain {
    pub fn named(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            user_id: String::new(),
            last_scan: None,
            total_scans: 0,
            ip_address: None,
            server: None,
            mail_server: None,
            risk_counts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainsResponse {
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub user_risk_counts: RiskCounts,
}

impl DomainsResponse {
    pub fn domain_names(&self) -> Vec<String> {
        self.domains.iter().map(|d| d.domain_name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDomainResponse {
    #[serde(default)]
    pub message: String,
    pub domain_name: String,
}

// ============================================================================
// PERMUTATIONS
// ============================================================================

/// A generated look-alike of a root domain with its scan results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permutation {
    pub permutation_name: String,
    pub domain_name: String,
    #[serde(default)]
    pub fuzzer: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub mail_server: Option<String>,
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub tlsh: Option<f64>,
    #[serde(default)]
    pub phash: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_spy: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// SCHEDULES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: String,
    pub schedule_name: String,
    pub domain_name: String,
    pub start_date: String,
    #[serde(default)]
    pub next_scan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulesResponse {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub hours: u32,
    pub domain_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduleResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub schedule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateScheduleResponse {
    #[serde(default)]
    pub message: String,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSchedulesResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deleted_schedules: Vec<String>,
}
