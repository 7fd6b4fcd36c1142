//! Error types for fuzzwatch operations

use thiserror::Error;

/// Persisted store errors.
///
/// These never reach readers of the store: reads degrade to "absent" and
/// writes degrade to no-ops. They are returned to writers that want to know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Persisted store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Failed to encode value for {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Storage IO error: {reason}")]
    Io { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Network boundary and hook errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Decode error: {reason}")]
    Decode { reason: String },

    #[error("Query disabled: {parameter} is required")]
    Disabled { parameter: String },

    #[error("No user signed in")]
    NotLoggedIn,

    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl ClientError {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status for server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request reached the network at all.
    pub fn reached_network(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http { .. } | Self::Decode { .. }
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or FUZZWATCH_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file: {reason}")]
    Io { reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all fuzzwatch errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FuzzwatchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for fuzzwatch operations.
pub type FuzzwatchResult<T> = Result<T, FuzzwatchError>;

// =============================================================================
// TESTS
// =============================================================================
