//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the pattern index (artifact or fresh build) and persist it
//! - Build the dispatch table from configuration
//! - Start metrics, config watcher, signal handling and the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when the index is ready)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, DispatchConfig};
use crate::dispatch::{Dispatcher, DispatchTable, HandlerTable};
use crate::http::HttpServer;
use crate::index::{artifact, IndexBuilder, IndexError, IndexResult, PatternIndex};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::TableRegistry;

/// Errors that stop the dispatcher from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("config watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the index for `config` at cold start.
///
/// With `prefer_artifact` and an existing artifact the registry is not
/// consulted; the artifact must not contain excluded backends. Otherwise
/// the index is built as in [`rebuild_index`].
pub fn load_index(config: &DispatchConfig) -> IndexResult<PatternIndex> {
    if config.index.prefer_artifact {
        let artifact_path = config.index.artifact_path.as_deref().map(Path::new);
        if let Some(path) = artifact_path.filter(|p| p.exists()) {
            let index = artifact::load(path)?;
            check_exclusions(&index, &IndexBuilder::from_config(&config.index))?;
            return Ok(index);
        }
    }
    rebuild_index(config)
}

/// Build the index from the registry, ignoring any existing artifact.
///
/// When `artifact_path` is set the fresh index is written back so the next
/// cold start can reuse it.
pub fn rebuild_index(config: &DispatchConfig) -> IndexResult<PatternIndex> {
    let registry = TableRegistry::from_config(&config.backends, config.index.include_builtin);
    let index = IndexBuilder::from_config(&config.index).build(&registry)?;

    if let Some(path) = config.index.artifact_path.as_deref().map(Path::new) {
        artifact::write(&index, path)?;
    }
    Ok(index)
}

fn check_exclusions(index: &PatternIndex, builder: &IndexBuilder) -> IndexResult<()> {
    match index.backends().into_iter().find(|b| builder.excludes(b.as_str())) {
        Some(backend) => Err(IndexError::Configuration {
            backend: backend.clone(),
            reason: "excluded backend present in index artifact".to_string(),
        }),
        None => Ok(()),
    }
}

/// Build the dispatch table for a cold start.
pub fn build_dispatch_table(config: &DispatchConfig) -> Result<DispatchTable, StartupError> {
    dispatch_table(config, load_index(config)?)
}

/// Build the dispatch table after a configuration change. The index is
/// always rebuilt so registration changes take effect.
pub fn rebuild_dispatch_table(config: &DispatchConfig) -> Result<DispatchTable, StartupError> {
    dispatch_table(config, rebuild_index(config)?)
}

fn dispatch_table(config: &DispatchConfig, index: PatternIndex) -> Result<DispatchTable, StartupError> {
    let handlers = HandlerTable::from_config(&config.backends, &config.timeouts);
    let table = DispatchTable::new(
        Dispatcher::new(Arc::new(index)),
        handlers,
        config.dispatch.clone(),
    )?;
    Ok(table)
}

/// Run the dispatcher until a shutdown signal arrives.
///
/// `config_path` enables hot reload of that file.
pub async fn run(config: DispatchConfig, config_path: Option<PathBuf>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let table = build_dispatch_table(&config)?;

    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let server = HttpServer::new(config, table);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
