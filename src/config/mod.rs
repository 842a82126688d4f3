//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ENVIRONMENT → profile.rs (baseline defaults)
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → passed by value to the relay and the front end
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod profile;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use profile::Profile;
pub use schema::{
    FrontConfig, ListenerConfig, ObservabilityConfig, RelayConfig, StoreConfig, WorkerConfig,
};
