//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::profile::Profile;
use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ConfigViolation};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value '{value}' for environment variable {key}")]
    Env { key: &'static str, value: String },
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<ConfigViolation>),
}

fn join_violations(errors: &[ConfigViolation]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// With a path the TOML file is the base; without one the active
/// [`Profile`] defaults are. Environment overrides apply on top of either.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Profile::from_env().defaults(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides, reading variables through `lookup`.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SOCKET_HOST") {
        config.listener.host = v;
    }
    override_parsed(&lookup, "SOCKET_PORT", &mut config.listener.port)?;
    override_parsed(&lookup, "SOCKET_BACKLOG", &mut config.listener.backlog)?;
    override_parsed(&lookup, "SOCKET_TIMEOUT_MS", &mut config.workers.read_timeout_ms)?;
    override_parsed(&lookup, "SOCKET_MAX_PAYLOAD_BYTES", &mut config.workers.max_payload_bytes)?;
    override_parsed(&lookup, "WORKER_MAX_WORKERS", &mut config.workers.max_workers)?;
    if let Some(v) = lookup("WORKER_NAME_PREFIX") {
        config.workers.name_prefix = v;
    }

    if let Some(v) = lookup("STORE_URI") {
        config.store.uri = v;
    }
    if let Some(v) = lookup("STORE_COLLECTION") {
        config.store.collection = v;
    }
    override_parsed(&lookup, "STORE_MAX_POOL_SIZE", &mut config.store.max_pool_size)?;
    override_parsed(&lookup, "STORE_MIN_POOL_SIZE", &mut config.store.min_pool_size)?;
    override_parsed(&lookup, "STORE_MAX_IDLE_TIME_MS", &mut config.store.max_idle_ms)?;
    override_parsed(&lookup, "STORE_WAIT_QUEUE_TIMEOUT_MS", &mut config.store.wait_timeout_ms)?;

    if let Some(v) = lookup("HTTP_HOST") {
        config.front.host = v;
    }
    override_parsed(&lookup, "HTTP_PORT", &mut config.front.port)?;
    if let Some(v) = lookup("FRONT_DIR") {
        config.front.static_dir = v;
    }
    if let Some(v) = lookup("RELAY_ADDRESS") {
        config.front.relay_address = v;
    }

    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v.to_ascii_lowercase();
    }

    Ok(())
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(key) {
        *slot = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { key, value })?;
    }
    Ok(())
}
