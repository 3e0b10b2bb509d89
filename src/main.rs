//! Driver hub server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http server ──▶ dispatcher ──▶ route tables
//!                                          │               │
//!                                          │         handler factory
//!                                          ▼               │
//!                                   session registry ◀─────┘
//!                                          │
//!                                     driver slot (one command at a time)
//!                                          │
//!     Client Response                      ▼
//!     ◀─────────────── renderer ◀──── outcome + Accept
//!
//!     session reaper ──(periodic)──▶ session registry
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use driver_hub::config::{load_config, validate_config, ConfigError, HubConfig};
use driver_hub::lifecycle::{spawn_signal_listener, Shutdown};
use driver_hub::observability::{logging, metrics};
use driver_hub::HubServer;

#[derive(Parser)]
#[command(name = "driver-hub")]
#[command(about = "Remote browser control hub speaking the JSON wire protocol", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the session timeout in seconds (0 disables expiry).
    #[arg(long)]
    session_timeout: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => HubConfig::default(),
    };
    apply_overrides(&mut config, &args)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "driver-hub starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.listener.base_path,
        session_timeout_secs = config.session.timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
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

    // Route table errors surface here, before anything is bound.
    let server = HubServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(Arc::clone(&shutdown));

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn apply_overrides(config: &mut HubConfig, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = args.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(timeout) = args.session_timeout {
        config.session.timeout_secs = timeout;
    }
    Ok(())
}
