//! Ride Matcher (v1)
//!
//! Finds the nearest available driver for a rider.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────┐
//!                              │                 RIDE MATCHER                  │
//!                              │                                               │
//!     Rider Request            │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!     ─────────────────────────┼─▶│  http   │───▶│ matching │───▶│   gate   │  │
//!                              │  │ server  │    │  engine  │    │ (breaker)│  │
//!                              │  └─────────┘    └────┬─────┘    └────┬─────┘  │
//!                              │                      │               │        │
//!                              │                      ▼               ▼        │
//!     Nearest Driver           │               ┌────────────┐  ┌────────────┐  │
//!     ◀────────────────────────┼───────────────│ geo/rank   │◀─│ directory  │◀─┼──── Location
//!                              │               └────────────┘  │  client    │  │     Service
//!                              │                               └────────────┘  │
//!                              │  ┌─────────────────────────────────────────┐  │
//!                              │  │ config · observability · lifecycle      │  │
//!                              │  └─────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use ride_matcher::http::HttpServer;
use ride_matcher::lifecycle::signals::spawn_signal_listener;
use ride_matcher::lifecycle::startup::load_or_default;
use ride_matcher::lifecycle::Shutdown;
use ride_matcher::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ride-matcher", version, about = "Nearest-driver matching service")]
struct Cli {
    /// Path to the TOML config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ride-matcher starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        directory = %config.directory.base_url,
        failure_threshold = config.gate.failure_threshold,
        reset_timeout_secs = config.gate.reset_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
