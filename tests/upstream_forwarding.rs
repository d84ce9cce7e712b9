//! Forwarding to upstream processes, hot reload and the admin API.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use backend_dispatch::admin::setup_admin_router;
use backend_dispatch::config::{BackendConfig, DispatchConfig};
use backend_dispatch::lifecycle::Shutdown;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;

use common::{json_body, server, sigv4, start_echo_upstream};

fn sqs_upstream(address: String) -> BackendConfig {
    BackendConfig {
        name: "sqs".into(),
        upstreams: vec![address],
        ..BackendConfig::default()
    }
}

fn sqs_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/123456789012/orders?Action=SendMessage")
        .header("host", "sqs.eu-central-1.amazonaws.com")
        .header("x-request-id", "fwd-1")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_request_forwarded_with_dispatch_headers() {
    let upstream = start_echo_upstream().await;
    let mut config = DispatchConfig::default();
    config.backends.push(sqs_upstream(upstream.to_string()));

    let response = server(config).router().oneshot(sqs_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = json_body(response).await;
    assert_eq!(json["path"], "/123456789012/orders?Action=SendMessage");
    assert_eq!(json["backend"], "sqs");
    assert_eq!(json["region"], "eu-central-1");
    assert_eq!(json["account_id"], "123456789012");
    assert_eq!(json["request_id"], "fwd-1");
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Bind then drop to get a port nothing listens on
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = DispatchConfig::default();
    config.backends.push(sqs_upstream(closed.to_string()));

    let response = server(config).router().oneshot(sqs_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_reload_swaps_dispatch_table() {
    let server = server(DispatchConfig::default());
    let state = server.state();

    let ledger_request = || {
        Request::builder()
            .uri("/entries")
            .header("host", "ledger.internal")
            .body(Body::empty())
            .unwrap()
    };
    let before = server.router().oneshot(ledger_request()).await.unwrap();
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    let mut config = DispatchConfig::default();
    config.backends.push(BackendConfig {
        name: "ledger".into(),
        url_bases: vec![r"https?://ledger\.internal".into()],
        ..BackendConfig::default()
    });
    state.reload(config).unwrap();

    let after = server.router().oneshot(ledger_request()).await.unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(json_body(after).await["backend"], "ledger");

    // A failed rebuild keeps the ledger table live
    let mut broken = DispatchConfig::default();
    broken.dispatch.fallback_backend = Some("apigatewayv2".into());
    assert!(state.reload(broken).is_err());
    assert!(state.table.load().dispatcher().index().contains_backend("ledger"));
}

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let mut config = DispatchConfig::default();
    config.admin.api_key = "test-admin-key".into();
    let server = server(config);
    let admin = setup_admin_router(server.state());

    let anonymous = Request::builder()
        .uri("/admin/status")
        .body(Body::empty())
        .unwrap();
    let response = admin.clone().oneshot(anonymous).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let resolve = Request::builder()
        .uri("/admin/resolve?url=https://kms.us-east-2.amazonaws.com/")
        .header("authorization", "Bearer test-admin-key")
        .body(Body::empty())
        .unwrap();
    let response = admin.oneshot(resolve).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["backend"], "kms");
    assert_eq!(json["pattern"], r"https?://kms\.(.+)\.amazonaws\.com");
}

#[tokio::test]
async fn test_served_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = server(DispatchConfig::default());
    let state = server.state();
    let shutdown = Shutdown::new();
    let (_updates_tx, updates) = mpsc::unbounded_channel();
    let handle = tokio::spawn(server.run(listener, updates, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/v1/describejobs"))
        .header("authorization", sigv4("batch", "us-west-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["backend"], "batch");
    assert_eq!(json["matched_by"], "signature");

    let stats = state.stats.snapshot();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.per_backend.get("batch"), Some(&1));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server stops after shutdown");
    assert!(result.unwrap().is_ok());
}

#[tokio::test]
async fn test_reload_rebuilds_when_artifact_preferred() {
    let dir = std::env::temp_dir().join(format!("backend-dispatch-reload-{}", std::process::id()));
    let mut config = DispatchConfig::default();
    config.index.artifact_path = Some(dir.join("index.json").to_string_lossy().into_owned());
    config.index.prefer_artifact = true;

    // Writes the artifact on the first start
    let server = server(config.clone());
    let state = server.state();

    config.backends.push(BackendConfig {
        name: "ledger".into(),
        url_bases: vec![r"https?://ledger\.internal".into()],
        ..BackendConfig::default()
    });
    state.reload(config).unwrap();
    assert!(state.table.load().dispatcher().index().contains_backend("ledger"));

    let request = Request::builder()
        .uri("/entries")
        .header("host", "ledger.internal")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(json_body(response).await["backend"], "ledger");

    let _ = std::fs::remove_dir_all(&dir);
}
