//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_requests_total` (counter): requests by method, route, status
//! - `registry_request_duration_seconds` (histogram): latency by route
//! - `registry_pix_payloads_total` (counter): payloads built, by source
//! - `registry_reservations_total` (counter): reservation attempts by outcome
//! - `registry_backend_calls_total` (counter): backend calls by procedure, outcome
//! - `registry_backend_call_duration_seconds` (histogram): backend latency
//! - `registry_rate_limited_total` (counter): rejected guest mutations
//! - `registry_config_reloads_total` (counter): reloads by result

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "registry_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("registry_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// `source` is `payload` or `contribution`.
pub fn record_pix_payload(source: &'static str) {
    counter!("registry_pix_payloads_total", "source" => source).increment(1);
}

/// `outcome` is `reserved`, `taken`, `cancelled` or `error`.
pub fn record_reservation(outcome: &'static str) {
    counter!("registry_reservations_total", "outcome" => outcome).increment(1);
}

pub fn record_backend_call(procedure: &'static str, outcome: &'static str, start: Instant) {
    counter!("registry_backend_calls_total", "procedure" => procedure, "outcome" => outcome).increment(1);
    histogram!("registry_backend_call_duration_seconds", "procedure" => procedure)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(route: &'static str) {
    counter!("registry_rate_limited_total", "route" => route).increment(1);
}

pub fn record_config_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("registry_config_reloads_total", "result" => result).increment(1);
}
