//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, pool bounds ordered)
//! - Reject collection names that are not plain identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ConfigViolation>>
//! - Runs before config is accepted into the system

use crate::config::schema::RelayConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ConfigViolation {
    /// Dotted path of the offending field (e.g. `store.max_pool_size`).
    pub field: &'static str,
    pub reason: String,
}

impl ConfigViolation {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ConfigViolation::new("listener.port", "must be in 1..=65535"));
    }
    if config.listener.backlog == 0 {
        errors.push(ConfigViolation::new("listener.backlog", "must be greater than 0"));
    }

    if config.workers.max_workers == 0 {
        errors.push(ConfigViolation::new("workers.max_workers", "must be greater than 0"));
    }
    if config.workers.read_timeout_ms == 0 {
        errors.push(ConfigViolation::new("workers.read_timeout_ms", "must be greater than 0"));
    }
    if config.workers.max_payload_bytes == 0 {
        errors.push(ConfigViolation::new("workers.max_payload_bytes", "must be greater than 0"));
    }
    if config.workers.drain_timeout_ms == Some(0) {
        errors.push(ConfigViolation::new(
            "workers.drain_timeout_ms",
            "must be greater than 0 when set",
        ));
    }

    let store = &config.store;
    if store.uri.trim().is_empty() {
        errors.push(ConfigViolation::new("store.uri", "must not be empty"));
    }
    if !is_identifier(&store.collection) {
        errors.push(ConfigViolation::new(
            "store.collection",
            format!("'{}' is not a plain identifier", store.collection),
        ));
    }
    if store.max_pool_size == 0 {
        errors.push(ConfigViolation::new("store.max_pool_size", "must be greater than 0"));
    }
    if store.max_pool_size < store.min_pool_size {
        errors.push(ConfigViolation::new(
            "store.max_pool_size",
            format!(
                "must be >= store.min_pool_size ({} < {})",
                store.max_pool_size, store.min_pool_size
            ),
        ));
    }
    if store.wait_timeout_ms == 0 {
        errors.push(ConfigViolation::new("store.wait_timeout_ms", "must be greater than 0"));
    }
    if store.max_idle_ms == 0 {
        errors.push(ConfigViolation::new("store.max_idle_ms", "must be greater than 0"));
    }
    if store.max_lifetime_ms == 0 {
        errors.push(ConfigViolation::new("store.max_lifetime_ms", "must be greater than 0"));
    }

    if config.front.port == 0 {
        errors.push(ConfigViolation::new("front.port", "must be in 1..=65535"));
    }
    if config.front.connect_timeout_ms == 0 {
        errors.push(ConfigViolation::new("front.connect_timeout_ms", "must be greater than 0"));
    }
    if config.front.request_timeout_ms == 0 {
        errors.push(ConfigViolation::new("front.request_timeout_ms", "must be greater than 0"));
    }
    if config.front.max_body_bytes == 0 {
        errors.push(ConfigViolation::new("front.max_body_bytes", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigViolation::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut config = RelayConfig::default();
        config.listener.port = 0;
        config.store.max_pool_size = 2;
        config.store.min_pool_size = 5;
        config.observability.log_level = "loud".into();
        config.workers.drain_timeout_ms = Some(0);
        config.store.max_lifetime_ms = 0;
        config.front.request_timeout_ms = 0;
        config.front.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.port",
                "workers.drain_timeout_ms",
                "store.max_pool_size",
                "store.max_lifetime_ms",
                "front.request_timeout_ms",
                "front.max_body_bytes",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn unset_drain_timeout_is_valid() {
        let mut config = RelayConfig::default();
        config.workers.drain_timeout_ms = None;
        assert!(validate_config(&config).is_ok());

        config.workers.drain_timeout_ms = Some(5_000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collection_must_be_identifier() {
        assert!(is_identifier("messages"));
        assert!(is_identifier("_msgs2"));
        assert!(!is_identifier("2msgs"));
        assert!(!is_identifier("msgs; DROP TABLE x"));
        assert!(!is_identifier(""));
    }
}
