//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by backend, outcome, status
//! - `dispatch_request_duration_seconds` (histogram): latency by backend
//! - `dispatch_index_entries` (gauge): entries in the most recent index
//! - `dispatch_index_builds_total` (counter): completed index builds
//! - `dispatch_index_build_duration_seconds` (histogram): build time
//! - `dispatch_reloads_total` (counter): configuration reloads by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no exporter
//!   installed every call is a no-op, which keeps tests and the CLI quiet
//! - Unmatched requests are labelled with backend `none`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_dispatch(backend: &str, outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "dispatch_requests_total",
        "backend" => backend.to_string(),
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dispatch_request_duration_seconds", "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a completed index build.
pub fn record_index_build(entries: usize, start: Instant) {
    gauge!("dispatch_index_entries").set(entries as f64);
    counter!("dispatch_index_builds_total").increment(1);
    histogram!("dispatch_index_build_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a configuration reload attempt.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("dispatch_reloads_total", "result" => result).increment(1);
}
