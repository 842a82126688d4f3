//! Resilience subsystem.
//!
//! # Design Decisions
//! - Per-connection failures are never retried (at-most-once delivery)
//! - Only the accept loop backs off, and only on anomalous errors

pub mod backoff;
