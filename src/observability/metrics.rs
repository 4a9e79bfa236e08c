//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): by method, status, route, outcome
//! - `gateway_request_duration_seconds` (histogram): full pipeline latency
//! - `gateway_upstream_latency_seconds` (histogram): per destination
//! - `gateway_admission_rejected_total` (counter): by policy
//! - `gateway_destination_healthy` (gauge): 1=eligible, 0=unhealthy
//!
//! # Design Decisions
//! - The `metrics` facade keeps recording cheap when no exporter is
//!   installed (tests, metrics disabled)
//! - Labels bounded by config cardinality (routes, policies, destinations)

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address and register
/// metric descriptions. Failure is logged, never propagated.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter, continuing without"),
    }

    describe_counter!(
        "gateway_requests_total",
        "Requests handled, by method, status, route and outcome"
    );
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Full pipeline duration per request"
    );
    describe_histogram!(
        "gateway_upstream_latency_seconds",
        "Upstream call latency per destination"
    );
    describe_counter!(
        "gateway_admission_rejected_total",
        "Requests rejected by rate limiting, by policy"
    );
    describe_gauge!(
        "gateway_destination_healthy",
        "Destination eligibility: 1 eligible, 0 unhealthy"
    );
}

/// Record the terminal outcome of one request.
pub fn record_request(method: &str, status: u16, route: &str, outcome: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one admission rejection.
pub fn record_rate_limited(policy: &str) {
    counter!(
        "gateway_admission_rejected_total",
        "policy" => policy.to_string()
    )
    .increment(1);
}

/// Record the latency of one upstream call.
pub fn record_upstream_latency(destination: &str, latency: Duration) {
    histogram!(
        "gateway_upstream_latency_seconds",
        "destination" => destination.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Record the current health of a destination.
pub fn record_destination_health(destination: &str, healthy: bool) {
    gauge!(
        "gateway_destination_healthy",
        "destination" => destination.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
