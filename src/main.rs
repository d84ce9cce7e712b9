//! Backend dispatcher for a cloud-service emulator.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌─────────────────────────────────────────────────────────┐
//!                              │                    BACKEND DISPATCH                      │
//!                              │                                                          │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐    ┌──────────────┐    │
//!     ─────────────────────────┼─▶│  http   │───▶│   dispatch   │───▶│   pattern    │    │
//!                              │  │ server  │    │    table     │    │    index     │    │
//!                              │  └─────────┘    └──────┬───────┘    └──────▲───────┘    │
//!                              │                        │                   │            │
//!                              │                        ▼                   │ build      │
//!                              │                 ┌──────────────┐    ┌──────┴───────┐    │
//!                              │                 │   backend    │    │   registry   │    │
//!                              │                 │   handler    │    │ + exclusions │    │
//!                              │                 └──────┬───────┘    └──────────────┘    │
//!                              │                        │                                │
//!     Client Response          │            stub answer │ or upstream (load balanced)    │
//!     ◀────────────────────────┼────────────────────────┘                                │
//!                              │                                                          │
//!                              │  config (+ watcher) · observability · admin · lifecycle  │
//!                              └─────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use backend_dispatch::config::{load_config, DispatchConfig};
use backend_dispatch::lifecycle::startup;
use backend_dispatch::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "backend-dispatch")]
#[command(about = "Routes emulated cloud API calls to their service backends", long_about = None)]
struct Args {
    /// TOML configuration file; watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "backend-dispatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_concurrent_requests = config.listener.max_concurrent_requests,
        request_timeout_secs = config.timeouts.request_secs,
        backends_configured = config.backends.len(),
        "Configuration loaded"
    );

    startup::run(config, args.config).await?;
    Ok(())
}
