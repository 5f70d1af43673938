//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by operation and status code
//! - `relay_request_duration_seconds` (histogram): latency by operation
//! - `relay_nonces_issued_total` (counter): hot-wallet nonces handed out
//! - `relay_gas_price_lookups_total` (counter): cached / refreshed / stale / fallback
//! - `relay_broadcasts_total` (counter): broadcasts by kind (send, sweep) and outcome
//! - `relay_upstream_errors_total` (counter): RPC failures by classification
//! - `relay_rpc_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and the CLI never need a recorder.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install Prometheus exporter"
        ),
    }
}

/// Record a finished HTTP request.
///
/// `operation` is the matched route template, e.g. `/tx-status/{tx_hash}`.
pub fn record_request(operation: &str, status: u16, start_time: Instant) {
    let operation = operation.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "relay_requests_total",
        "operation" => operation.clone(),
        "status" => status
    )
    .increment(1);
    ::metrics::histogram!("relay_request_duration_seconds", "operation" => operation)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_nonce_issued() {
    ::metrics::counter!("relay_nonces_issued_total").increment(1);
}

pub fn record_gas_price_lookup(outcome: &'static str) {
    ::metrics::counter!("relay_gas_price_lookups_total", "outcome" => outcome).increment(1);
}

/// `kind` is `send` or `sweep`; `outcome` is `sent` or an error type.
pub fn record_broadcast(kind: &'static str, outcome: &'static str) {
    ::metrics::counter!("relay_broadcasts_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    ::metrics::gauge!("relay_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("/send", 200, Instant::now());
        record_nonce_issued();
        record_gas_price_lookup("cached");
        record_broadcast("sweep", "sent");
        record_upstream_error("timeout");
        record_rpc_health(false);
    }
}
