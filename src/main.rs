//! spool-gate
//!
//! Reverse proxy in front of the Spool Tracker application that throttles
//! login attempts per client IP.
//!
//! ```text
//!     Client ──▶ listener ──▶ request id ──▶ login throttle ──▶ proxy ──▶ Spool Tracker
//!                                                │
//!                                                └──▶ 429 + Retry-After
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use spool_gate::config::{load_config, watcher::ConfigWatcher, GateConfig};
use spool_gate::lifecycle::Shutdown;
use spool_gate::observability::{logging, metrics};
use spool_gate::HttpServer;

#[derive(Parser)]
#[command(name = "spool-gate", version, about = "Login rate-limiting gate for Spool Tracker")]
struct Args {
    /// Path to the TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "SPOOL_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Do not reload the configuration file when it changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "spool-gate starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        rate_limit_enabled = config.rate_limit.enabled,
        window_ms = config.rate_limit.window_ms,
        max_attempts = config.rate_limit.max_attempts,
        max_keys = config.rate_limit.max_keys,
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

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) if !args.no_watch => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
