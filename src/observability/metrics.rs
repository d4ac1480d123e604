//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record per-request counters and latency
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, backend
//! - `proxy_request_duration_seconds` (histogram): latency by backend

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Must run inside the
/// tokio runtime.
pub fn init(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(err) => tracing::error!(error = %err, "failed to start metrics endpoint"),
    }
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, backend: &str, started: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "backend" => backend.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}
