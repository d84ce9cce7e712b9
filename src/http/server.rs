//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, concurrency limit, timeout, request ID)
//! - Bind server to listener, optionally start the admin API
//! - Dispatch every request to the backend that owns its URL
//! - Swap in a rebuilt dispatch table on configuration change

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::DispatchConfig;
use crate::dispatch::{DispatchContext, DispatchStats, DispatchTable};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response;
use crate::lifecycle::startup::{rebuild_dispatch_table, StartupError};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live dispatch table, replaced whole on reload.
    pub table: Arc<ArcSwap<DispatchTable>>,
    /// Configuration the live table was built from.
    pub config: Arc<ArcSwap<DispatchConfig>>,
    /// Counters that survive reloads.
    pub stats: Arc<DispatchStats>,
}

impl AppState {
    pub fn new(config: DispatchConfig, table: DispatchTable) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
            config: Arc::new(ArcSwap::from_pointee(config)),
            stats: Arc::new(DispatchStats::new()),
        }
    }

    /// Rebuild the dispatch table from `config` and swap it in.
    ///
    /// The index is always rebuilt from the registry, never taken from the
    /// artifact. On failure the current table stays live. Listener settings
    /// are read once at startup and are not affected.
    pub fn reload(&self, config: DispatchConfig) -> Result<(), StartupError> {
        match rebuild_dispatch_table(&config) {
            Ok(table) => {
                let entries = table.dispatcher().index().len();
                self.table.store(Arc::new(table));
                self.config.store(Arc::new(config));
                metrics::record_reload(true);
                tracing::info!(entries, "Dispatch table reloaded");
                Ok(())
            }
            Err(e) => {
                metrics::record_reload(false);
                tracing::error!(error = %e, "Dispatch table rebuild failed, keeping current table");
                Err(e)
            }
        }
    }
}

/// HTTP server for the dispatcher.
pub struct HttpServer {
    router: Router,
    config: DispatchConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server around an already built dispatch table.
    pub fn new(config: DispatchConfig, table: DispatchTable) -> Self {
        let state = AppState::new(config.clone(), table);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatchConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_concurrent_requests))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates arriving on `config_updates` rebuild the
    /// dispatch table; the server stops when `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DispatchConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            entries = self.state.table.load().dispatcher().index().len(),
            "HTTP server starting"
        );

        // Reload loop
        let reload_state = self.state.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                let _ = reload_state.reload(config);
            }
        });

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_router = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %self.config.admin.bind_address, "Admin API listening");
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

/// Main dispatch handler.
/// Resolves the owning backend and hands the request to its handler.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let table = state.table.load_full();

    let decision = table.decide(request.uri(), request.headers());

    let Some(target) = decision.target else {
        tracing::warn!(request_id = %request_id, url = %decision.url, "No backend claims request");
        state.stats.record(None);
        metrics::record_dispatch("none", "not_found", 404, start_time);
        return response::not_found(&decision.url, &request_id);
    };

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        url = %decision.url,
        backend = %target.backend,
        matched_by = target.source.as_str(),
        region = %decision.scope.region,
        "Dispatching request"
    );

    let handler = table.handler(&target.backend);
    let ctx = DispatchContext {
        backend: target.backend.clone(),
        source: target.source,
        scope: decision.scope,
        request_id,
        url: decision.url,
    };
    let response = handler.handle(ctx, request).await;

    state.stats.record(Some(&target.backend));
    metrics::record_dispatch(
        target.backend.as_str(),
        target.source.as_str(),
        response.status().as_u16(),
        start_time,
    );
    response
}
