//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): dispatched requests by outcome and status
//! - `edge_request_duration_seconds` (histogram): dispatch latency
//! - `edge_reloads_total` (counter): reload attempts by result
//! - `edge_routes` (gauge): routes in the installed table

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one dispatched request. `route` is the matched index, if any.
pub fn record_dispatch(route: Option<usize>, status: StatusCode, start: Instant) {
    let outcome = if route.is_some() { "matched" } else { "not_found" };
    ::metrics::counter!(
        "edge_requests_total",
        "outcome" => outcome,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    ::metrics::histogram!("edge_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a reload attempt and the size of the table now serving.
pub fn record_reload(success: bool, routes: usize) {
    let result = if success { "success" } else { "failure" };
    ::metrics::counter!("edge_reloads_total", "result" => result).increment(1);
    ::metrics::gauge!("edge_routes").set(routes as f64);
}
