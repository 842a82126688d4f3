//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_connections_accepted_total` (counter)
//! - `relay_accept_errors_total` (counter)
//! - `relay_connection_outcomes_total` (counter): by `outcome`
//! - `relay_messages_saved_total` / `relay_save_failures_total` (counters)
//! - `relay_save_duration_seconds` (histogram)
//! - `relay_workers_busy` (gauge)
//! - `relay_front_submissions_total` (counter): by `result`
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional (`observability.metrics_enabled`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_connection_accepted() {
    counter!("relay_connections_accepted_total").increment(1);
}

pub fn record_accept_error() {
    counter!("relay_accept_errors_total").increment(1);
}

/// Outcome of one connection: `saved`, or a failure reason code.
pub fn record_connection_outcome(outcome: &'static str) {
    counter!("relay_connection_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_save(ok: bool, started: Instant) {
    if ok {
        counter!("relay_messages_saved_total").increment(1);
    } else {
        counter!("relay_save_failures_total").increment(1);
    }
    histogram!("relay_save_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_busy_workers(busy: usize) {
    gauge!("relay_workers_busy").set(busy as f64);
}

pub fn record_front_submission(result: &'static str) {
    counter!("relay_front_submissions_total", "result" => result).increment(1);
}
