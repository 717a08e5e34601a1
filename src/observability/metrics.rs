//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_rate_limited_total` (counter): rejected login attempts by path
//! - `gate_limiter_keys` (gauge): distinct clients tracked by the limiter
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("gate_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("gate_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited(path: &str) {
    counter!("gate_rate_limited_total", "path" => path.to_string()).increment(1);
}

/// Record how many clients the limiter currently tracks.
pub fn record_limiter_size(size: usize) {
    gauge!("gate_limiter_keys").set(size as f64);
}
