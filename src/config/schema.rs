//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay
//! and its HTTP front end. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the message relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay listener configuration (bind address, backlog).
    pub listener: ListenerConfig,

    /// Worker pool sizing and per-connection limits.
    pub workers: WorkerConfig,

    /// Document store connection pool settings.
    pub store: StoreConfig,

    /// HTTP front end settings.
    pub front: FrontConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Relay listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (IP address or resolvable name).
    pub host: String,

    /// TCP port to bind.
    pub port: u16,

    /// Listen backlog passed to `listen(2)`.
    pub backlog: u32,
}

impl ListenerConfig {
    /// `host:port` form used for resolution and logging.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            backlog: 10,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of connections processed concurrently.
    pub max_workers: usize,

    /// Prefix used in worker span names.
    pub name_prefix: String,

    /// Upper bound on reading one inbound payload, in milliseconds.
    pub read_timeout_ms: u64,

    /// Largest accepted payload. Larger payloads are rejected, not truncated.
    pub max_payload_bytes: usize,

    /// Optional deadline for draining in-flight workers at shutdown.
    /// `None` waits for every worker.
    pub drain_timeout_ms: Option<u64>,
}

impl WorkerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            name_prefix: "relay-worker".to_string(),
            read_timeout_ms: 30_000,
            max_payload_bytes: 64 * 1024,
            drain_timeout_ms: None,
        }
    }
}

/// Document store connection pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store URI (e.g., "sqlite://messages.db?mode=rwc").
    pub uri: String,

    /// Collection the relay appends message documents to.
    pub collection: String,

    /// Ceiling on concurrently open backend connections.
    pub max_pool_size: u32,

    /// Connections kept open even when idle.
    pub min_pool_size: u32,

    /// Idle connections older than this are recycled, in milliseconds.
    pub max_idle_ms: u64,

    /// How long a writer may wait for a free connection, in milliseconds.
    pub wait_timeout_ms: u64,

    /// Maximum age of a pooled connection, in milliseconds.
    pub max_lifetime_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "sqlite://messages.db?mode=rwc".to_string(),
            collection: "messages".to_string(),
            max_pool_size: 50,
            min_pool_size: 5,
            max_idle_ms: 30_000,
            wait_timeout_ms: 5_000,
            max_lifetime_ms: 30 * 60 * 1000,
        }
    }
}

/// HTTP front end configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontConfig {
    /// Host to bind the HTTP server on.
    pub host: String,

    /// HTTP port.
    pub port: u16,

    /// Directory holding the form pages and assets.
    pub static_dir: String,

    /// Address of the relay listener submissions are forwarded to.
    pub relay_address: String,

    /// Timeout for connecting to the relay, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Total time allowed per HTTP request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum accepted HTTP request body.
    pub max_body_bytes: usize,
}

impl FrontConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "front-init".to_string(),
            relay_address: "127.0.0.1:5000".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
