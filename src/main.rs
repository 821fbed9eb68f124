//! Office Gateway
//!
//! HTTP gateway in front of the document generation and content reading
//! services, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──▶ trust proxy ─▶ cors ─▶ security headers ─▶ rate limit ─▶ body parser
//!                                                                      │
//!   ◀── error handler ◀── dispatch ◀── request logger ◀── header strip ◀┘
//!                            │
//!                            ├── /health-check
//!                            ├── /images/*            (static files)
//!                            ├── /youtube-transcript  ┐
//!                            ├── /web-page-reader     │
//!                            ├── /powerpoint-generator├─▶ collaborators
//!                            ├── /word-generator      │
//!                            ├── /excel-generator     ┘
//!                            └── / , /swagger.json    (API docs)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use office_gateway::config::resolve_config;
use office_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use office_gateway::observability::{logging, metrics};
use office_gateway::{CollaboratorRegistry, GatewayServer};

#[derive(Parser)]
#[command(name = "office-gateway")]
#[command(about = "HTTP gateway for the office document and content services", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "office-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit_enabled = config.rate_limit.enabled,
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

    let registry = CollaboratorRegistry::from_config(&config.collaborators)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = GatewayServer::new(config, registry);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
