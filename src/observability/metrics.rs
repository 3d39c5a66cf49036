//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define matcher metrics (lookups, latency, gate state, directory calls)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `ride_matcher_match_requests_total` (counter): lookups by outcome
//! - `ride_matcher_match_duration_seconds` (histogram): lookup latency by outcome
//! - `ride_matcher_directory_calls_total` (counter): directory calls by result
//! - `ride_matcher_gate_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `ride_matcher_gate_rejections_total` (counter): calls denied by the gate
//! - `ride_matcher_http_requests_total` (counter): API responses by route, status

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::GateState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_match(outcome: &'static str, start: Instant) {
    metrics::counter!("ride_matcher_match_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("ride_matcher_match_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_directory_call(result: &'static str) {
    metrics::counter!("ride_matcher_directory_calls_total", "result" => result).increment(1);
}

pub fn record_gate_state(resource: &str, state: GateState) {
    metrics::gauge!("ride_matcher_gate_state", "resource" => resource.to_string())
        .set(state as u8 as f64);
}

pub fn record_gate_rejection(resource: &str) {
    metrics::counter!("ride_matcher_gate_rejections_total", "resource" => resource.to_string())
        .increment(1);
}

pub fn record_http_response(route: &str, status: u16) {
    metrics::counter!(
        "ride_matcher_http_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
