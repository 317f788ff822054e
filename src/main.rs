//! Gift registry service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Guest / Admin          ┌──────────────────────────────────────────────┐
//!     ─────────────────────▶ │ http (axum router + tower-http layers)       │
//!                            │   ├─ gifts / event / pix handlers            │
//!                            │   └─ admin (bearer token)                    │
//!                            │            │                                 │
//!                            │            ▼                                 │
//!                            │ registry::RegistryBackend                    │
//!                            │   ├─ memory (seeded from config)             │
//!                            │   └─ postgrest ─────────────────────────────────▶ hosted DB
//!                            │                                              │
//!                            │ pix (BR Code payload + QR)                   │
//!                            │ config (TOML, hot reload) · observability    │
//!                            │ security (rate limits, headers) · lifecycle  │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gift_registry::config::{load_config, ConfigWatcher};
use gift_registry::http::HttpServer;
use gift_registry::lifecycle::{build_backend, signals, Shutdown};
use gift_registry::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gift-registry")]
#[command(about = "Gift registry service with Pix contributions", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = ?args.config, "gift-registry starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = build_backend(&config.backend)?;

    let (watcher, config_updates) = ConfigWatcher::new(&args.config);
    let _watch_handle = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        admin = config.admin.enabled,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(config, backend)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
