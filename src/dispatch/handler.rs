//! Backend handlers.
//!
//! # Responsibilities
//! - Define the seam between dispatch and a backend implementation
//! - Provide the stub responder used when a backend has no upstreams
//! - Forward requests to upstream processes serving a backend
//!
//! # Design Decisions
//! - Handlers never fail; upstream problems become 502/503 responses
//! - The stub answers 200 with a JSON description of the dispatch, standing
//!   in for service emulation that lives outside this crate

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;

use crate::config::{BackendConfig, TimeoutConfig};
use crate::dispatch::scope::RequestScope;
use crate::http::X_REQUEST_ID;
use crate::index::BackendId;
use crate::load_balancer::pool::UpstreamPool;

/// Response header naming the backend that served the request.
pub const X_DISPATCH_BACKEND: &str = "x-dispatch-backend";
/// Region the request was scoped to, forwarded to upstreams.
pub const X_DISPATCH_REGION: &str = "x-dispatch-region";
/// Account the request was scoped to, forwarded to upstreams.
pub const X_DISPATCH_ACCOUNT: &str = "x-dispatch-account-id";

/// How the backend was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// The request URL matched an index pattern.
    Url,
    /// The URL synthesized from the SigV4 credential scope matched.
    Signature,
    /// Nothing matched; the configured fallback backend was used.
    Fallback,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Url => "url",
            MatchSource::Signature => "signature",
            MatchSource::Fallback => "fallback",
        }
    }
}

/// Everything a handler knows about a dispatched request.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub backend: BackendId,
    pub source: MatchSource,
    pub scope: RequestScope,
    pub request_id: String,
    pub url: String,
}

/// A backend implementation reachable through the dispatcher.
#[async_trait]
pub trait BackendHandler: Send + Sync + fmt::Debug {
    async fn handle(&self, ctx: DispatchContext, request: Request<Body>) -> Response;
}

#[derive(Serialize)]
struct StubBody<'a> {
    backend: &'a BackendId,
    matched_by: MatchSource,
    method: &'a str,
    url: &'a str,
    region: &'a str,
    account_id: &'a str,
    request_id: &'a str,
}

/// Answers every request with a description of where it was dispatched.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubHandler;

#[async_trait]
impl BackendHandler for StubHandler {
    async fn handle(&self, ctx: DispatchContext, request: Request<Body>) -> Response {
        let body = StubBody {
            backend: &ctx.backend,
            matched_by: ctx.source,
            method: request.method().as_str(),
            url: &ctx.url,
            region: &ctx.scope.region,
            account_id: &ctx.scope.account_id,
            request_id: &ctx.request_id,
        };
        let mut response = (StatusCode::OK, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(ctx.backend.as_str()) {
            response.headers_mut().insert(X_DISPATCH_BACKEND, value);
        }
        response
    }
}

/// Forwards requests to the upstream processes of one backend.
pub struct UpstreamHandler {
    pool: UpstreamPool,
    client: Client<HttpConnector, Body>,
}

impl fmt::Debug for UpstreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamHandler")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl UpstreamHandler {
    pub fn new(pool: UpstreamPool, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { pool, client }
    }

    pub fn pool(&self) -> &UpstreamPool {
        &self.pool
    }
}

#[async_trait]
impl BackendHandler for UpstreamHandler {
    async fn handle(&self, ctx: DispatchContext, request: Request<Body>) -> Response {
        let guard = match self.pool.acquire() {
            Some(g) => g,
            None => {
                tracing::warn!(request_id = %ctx.request_id, backend = %ctx.backend, "No upstream capacity");
                return (StatusCode::SERVICE_UNAVAILABLE, "No upstream capacity").into_response();
            }
        };

        let (mut parts, body) = request.into_parts();

        // URI rewrite onto the upstream's base URL
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = format!("{}{}", guard.base_url.as_str().trim_end_matches('/'), path_and_query);
        parts.uri = match target.parse::<Uri>() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %ctx.request_id, error = %e, "Failed to build upstream URI");
                return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
            }
        };

        for (name, value) in [
            (X_REQUEST_ID, ctx.request_id.as_str()),
            (X_DISPATCH_BACKEND, ctx.backend.as_str()),
            (X_DISPATCH_REGION, ctx.scope.region.as_str()),
            (X_DISPATCH_ACCOUNT, ctx.scope.account_id.as_str()),
        ] {
            if let Ok(value) = HeaderValue::from_str(value) {
                parts.headers.insert(name, value);
            }
        }

        let upstream_addr = guard.addr;
        tracing::debug!(request_id = %ctx.request_id, backend = %ctx.backend, upstream = %upstream_addr, "Forwarding request");

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(request_id = %ctx.request_id, upstream = %upstream_addr, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Handler per backend, with the stub as default.
#[derive(Debug, Clone)]
pub struct HandlerTable {
    handlers: HashMap<BackendId, Arc<dyn BackendHandler>>,
    default: Arc<dyn BackendHandler>,
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new(Arc::new(StubHandler))
    }
}

impl HandlerTable {
    pub fn new(default: Arc<dyn BackendHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            default,
        }
    }

    /// Upstream handlers for every configured backend that lists upstreams.
    pub fn from_config(backends: &[BackendConfig], timeouts: &TimeoutConfig) -> Self {
        let mut table = Self::default();
        let connect_timeout = Duration::from_secs(timeouts.connect_secs);
        for backend in backends.iter().filter(|b| !b.upstreams.is_empty()) {
            let pool = UpstreamPool::from_config(backend);
            table.insert(
                backend.name.as_str(),
                Arc::new(UpstreamHandler::new(pool, connect_timeout)),
            );
        }
        table
    }

    pub fn insert(&mut self, backend: impl Into<BackendId>, handler: Arc<dyn BackendHandler>) {
        self.handlers.insert(backend.into(), handler);
    }

    pub fn get(&self, backend: &BackendId) -> Arc<dyn BackendHandler> {
        self.handlers
            .get(backend)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Backends with a dedicated handler.
    pub fn configured(&self) -> impl Iterator<Item = &BackendId> {
        self.handlers.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(backend: &str) -> DispatchContext {
        DispatchContext {
            backend: BackendId::new(backend),
            source: MatchSource::Url,
            scope: RequestScope {
                region: "us-west-2".into(),
                account_id: "123456789012".into(),
                signing_service: None,
            },
            request_id: "req-1".into(),
            url: "https://batch.us-west-2.amazonaws.com/v1/describejobs".into(),
        }
    }

    #[tokio::test]
    async fn test_stub_describes_dispatch() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/describejobs")
            .body(Body::empty())
            .unwrap();
        let response = StubHandler.handle(context("batch"), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_DISPATCH_BACKEND], "batch");

        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["backend"], "batch");
        assert_eq!(json["matched_by"], "url");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["region"], "us-west-2");
        assert_eq!(json["request_id"], "req-1");
    }

    #[tokio::test]
    async fn test_upstream_without_capacity_is_unavailable() {
        let config = BackendConfig {
            name: "sqs".into(),
            upstreams: vec!["127.0.0.1:1".into()],
            max_connections: 0,
            ..BackendConfig::default()
        };
        let handler = UpstreamHandler::new(UpstreamPool::from_config(&config), Duration::from_secs(1));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = handler.handle(context("sqs"), request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_table_falls_back_to_default() {
        let backends = vec![BackendConfig {
            name: "sqs".into(),
            upstreams: vec!["127.0.0.1:7001".into()],
            ..BackendConfig::default()
        }];
        let table = HandlerTable::from_config(&backends, &TimeoutConfig::default());
        assert_eq!(table.configured().count(), 1);
        assert!(format!("{:?}", table.get(&BackendId::new("sqs"))).contains("UpstreamHandler"));
        assert!(format!("{:?}", table.get(&BackendId::new("sns"))).contains("StubHandler"));
    }
}
