//! Deployment profiles.
//!
//! A profile picks the baseline configuration before the config file and
//! environment overrides are applied. Selected by the `ENVIRONMENT` variable.

use crate::config::schema::RelayConfig;

/// Deployment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Testing,
}

impl Profile {
    /// Parse a profile name. Unknown names fall back to development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" => Profile::Production,
            "testing" => Profile::Testing,
            _ => Profile::Development,
        }
    }

    /// Read the profile from the `ENVIRONMENT` variable.
    pub fn from_env() -> Self {
        std::env::var("ENVIRONMENT")
            .map(|v| Self::from_name(&v))
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
            Profile::Testing => "testing",
        }
    }

    /// Baseline configuration for this profile.
    pub fn defaults(&self) -> RelayConfig {
        let mut config = RelayConfig::default();
        match self {
            Profile::Development => {
                config.observability.log_level = "debug".to_string();
            }
            Profile::Production => {
                config.observability.log_level = "warn".to_string();
                config.workers.max_workers = 20;
                config.store.max_pool_size = 100;
            }
            Profile::Testing => {
                config.observability.log_level = "debug".to_string();
                config.store.max_pool_size = 10;
                config.store.uri = "sqlite://test_messages.db?mode=rwc".to_string();
            }
        }
        config
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
