//! Shared utilities for integration tests.

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use backend_dispatch::config::DispatchConfig;
use backend_dispatch::lifecycle::startup::build_dispatch_table;
use backend_dispatch::HttpServer;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// SigV4 `Authorization` header for `service` in `region`.
#[allow(dead_code)]
pub fn sigv4(service: &str, region: &str) -> String {
    format!(
        "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/{region}/{service}/aws4_request, SignedHeaders=host;x-amz-date, Signature=0"
    )
}

/// Build a server for `config` without binding it.
#[allow(dead_code)]
pub fn server(config: DispatchConfig) -> HttpServer {
    let table = build_dispatch_table(&config).expect("dispatch table builds");
    HttpServer::new(config, table)
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn echo(headers: HeaderMap, request: Request<Body>) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "path": request.uri().path_and_query().map(|pq| pq.as_str()),
            "backend": header("x-dispatch-backend"),
            "region": header("x-dispatch-region"),
            "account_id": header("x-dispatch-account-id"),
            "request_id": header("x-request-id"),
        })),
    )
}

/// Start an upstream on an ephemeral port that echoes what it received.
#[allow(dead_code)]
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(any(echo));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
