//! Message relay (v1)
//!
//! Accepts one JSON message per TCP connection and persists it through a
//! pooled document store.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    MESSAGE RELAY                      │
//!                   │                                                       │
//!  Front end        │  ┌──────────┐   ┌─────────────┐   ┌───────────────┐  │
//!  ─────────────────┼─▶│   net    │──▶│   worker    │──▶│    message    │  │
//!  (one payload     │  │ listener │   │    pool     │   │   validator   │  │
//!   per connection) │  └──────────┘   └─────────────┘   └───────┬───────┘  │
//!                   │                                          │           │
//!                   │                                          ▼           │
//!                   │                                  ┌───────────────┐   │
//!                   │                                  │ store writer  │   │
//!                   │                                  │  + pool client│───┼──▶ Backend
//!                   │                                  └───────────────┘   │
//!                   │                                                       │
//!                   │  ┌─────────────────────────────────────────────────┐ │
//!                   │  │ config │ lifecycle │ observability │ resilience │ │
//!                   │  └─────────────────────────────────────────────────┘ │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use message_relay::config::load_config;
use message_relay::lifecycle::{RelayController, SignalListener, StartupError};
use message_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "message-relay")]
#[command(about = "TCP message relay with pooled persistence", long_about = None)]
struct Cli {
    /// TOML config file. Profile defaults (ENVIRONMENT) apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("message-relay: {e}");
            return ExitCode::from(StartupError::Config(e).exit_code());
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("message-relay: failed to initialize logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "message-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_workers = config.workers.max_workers,
        collection = %config.store.collection,
        max_pool_size = config.store.max_pool_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let controller = RelayController::new(config);

    let signals = match SignalListener::install() {
        Ok(signals) => signals,
        Err(e) => {
            let err = StartupError::Signals(e);
            tracing::error!(error = %err, "Startup failed");
            return ExitCode::from(err.exit_code());
        }
    };
    signals.spawn(controller.shutdown_handle());

    let relay = match controller.start().await {
        Ok(relay) => relay,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::from(e.exit_code());
        }
    };

    let report = relay.serve().await;
    tracing::info!(
        drained = report.drained,
        store_closed = report.store_closed,
        "Shutdown complete"
    );
    ExitCode::SUCCESS
}
