//! Metrics collection and exposition.
//!
//! # Metrics
//! - `swan_cluster_demotions_total` (counter): UP → DOWN transitions by endpoint
//! - `swan_cluster_recoveries_total` (counter): DOWN → UP transitions by endpoint
//! - `swan_cluster_probe_attempts_total` (counter): liveness checks by endpoint, result
//! - `swan_cluster_members` (gauge): member count by status
//!
//! Recording is a no-op until a recorder is installed, so the library can be
//! used without exposing metrics at all.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_demotion(endpoint: &str) {
    counter!("swan_cluster_demotions_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_recovery(endpoint: &str) {
    counter!("swan_cluster_recoveries_total", "endpoint" => endpoint.to_string()).increment(1);
}

/// `result` is one of `success`, `status`, `error`, `timeout`.
pub fn record_probe_attempt(endpoint: &str, result: &'static str) {
    counter!(
        "swan_cluster_probe_attempts_total",
        "endpoint" => endpoint.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_membership(up: usize, down: usize) {
    gauge!("swan_cluster_members", "status" => "up").set(up as f64);
    gauge!("swan_cluster_members", "status" => "down").set(down as f64);
}
