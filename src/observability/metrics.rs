//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_routes_registered_total` (counter): registrations, overwrites included
//! - `router_dispatch_total` (counter): dispatches by outcome (hit, miss)
//! - `router_http_requests_total` (counter): HTTP requests by method, status
//! - `router_http_request_duration_seconds` (histogram): HTTP latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_registered() {
    metrics::counter!("router_routes_registered_total").increment(1);
}

pub fn record_dispatch(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    metrics::counter!("router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "router_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("router_http_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
