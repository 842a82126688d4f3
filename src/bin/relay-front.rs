//! HTTP front end for the message relay.
//!
//! Serves the form pages and forwards each submission to the relay over TCP.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use message_relay::config::load_config;
use message_relay::front::{FrontError, FrontServer};
use message_relay::lifecycle::{Shutdown, SignalListener};
use message_relay::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "relay-front")]
#[command(about = "HTTP front end forwarding form submissions to the message relay", long_about = None)]
struct Cli {
    /// TOML config file. Profile defaults (ENVIRONMENT) apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Static directory, overriding `front.static_dir`.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("relay-front: {e}");
            return ExitCode::from(1);
        }
    };
    if let Some(dir) = cli.static_dir {
        config.front.static_dir = dir.display().to_string();
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("relay-front: failed to initialize logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-front starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = match FrontServer::new(&config.front) {
        Ok(server) => server,
        Err(e) => return fail(e),
    };

    let shutdown = Shutdown::new();
    match SignalListener::install() {
        Ok(signals) => {
            signals.spawn(shutdown.clone());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return ExitCode::from(4);
        }
    }

    let listener = match FrontServer::bind(&config.front).await {
        Ok(listener) => listener,
        Err(e) => return fail(e),
    };

    if let Err(e) = server.run(listener, shutdown).await {
        return fail(e);
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn fail(err: FrontError) -> ExitCode {
    tracing::error!(error = %err, "relay-front failed");
    let code = match err {
        FrontError::MissingStaticDir(_) => 2,
        FrontError::Bind { .. } => 3,
        FrontError::Serve(_) => 5,
    };
    ExitCode::from(code)
}
