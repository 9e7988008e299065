//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_routing_decisions_total` (counter): by action, identity (new/returning)
//! - `edge_decision_failures_total` (counter): by operation
//! - `edge_decision_latency_seconds` (histogram): by operation
//! - `edge_flush_total` (counter): by result (ok, error, coalesced)
//! - `edge_events_dropped_total` (counter): events refused by a full buffer
//! - `edge_pages_served_total` (counter): by source (prerendered, rendered)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_routing(action: &'static str, minted: bool) {
    let identity = if minted { "new" } else { "returning" };
    counter!("edge_routing_decisions_total", "action" => action, "identity" => identity).increment(1);
}

pub fn record_decision_failure(op: &'static str) {
    counter!("edge_decision_failures_total", "op" => op).increment(1);
}

pub fn record_decision_latency(op: &'static str, start: Instant) {
    histogram!("edge_decision_latency_seconds", "op" => op).record(start.elapsed().as_secs_f64());
}

pub fn record_flush(result: &'static str) {
    counter!("edge_flush_total", "result" => result).increment(1);
}

pub fn record_event_dropped() {
    counter!("edge_events_dropped_total").increment(1);
}

pub fn record_page(source: &'static str) {
    counter!("edge_pages_served_total", "source" => source).increment(1);
}
