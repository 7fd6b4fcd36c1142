//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use fuzzwatch_core::ConfigError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns `Ok(false)` when a
/// subscriber was already installed, which is normal in tests.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::InvalidValue {
            field: "logging.filter".to_string(),
            reason: e.to_string(),
        })?,
    };

    let json_layer = config.json.then(|| fmt::layer().json().with_target(true));
    let plain_layer = (!config.json).then(|| fmt::layer().with_target(true));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(json = config.json, "Tracing initialized");
    } else {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(installed)
}
