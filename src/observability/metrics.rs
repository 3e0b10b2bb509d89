//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define hub metrics (commands, latency, sessions)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `driver_hub_commands_total` (counter): dispatched commands by method, outcome
//! - `driver_hub_command_duration_seconds` (histogram): dispatch latency by method
//! - `driver_hub_sessions_active` (gauge): live sessions
//! - `driver_hub_sessions_reaped_total` (counter): sessions removed for inactivity
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels stay low-cardinality (no session ids, no paths)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const COMMANDS_TOTAL: &str = "driver_hub_commands_total";
pub const COMMAND_DURATION_SECONDS: &str = "driver_hub_command_duration_seconds";
pub const SESSIONS_ACTIVE: &str = "driver_hub_sessions_active";
pub const SESSIONS_REAPED_TOTAL: &str = "driver_hub_sessions_reaped_total";

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One dispatched request. `outcome` is an outcome name or a routing
/// result such as `not_found`.
pub fn record_command(method: &str, outcome: &str, start: Instant) {
    metrics::counter!(COMMANDS_TOTAL, "method" => method.to_string(), "outcome" => outcome.to_string())
        .increment(1);
    metrics::histogram!(COMMAND_DURATION_SECONDS, "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_sessions_active(count: usize) {
    metrics::gauge!(SESSIONS_ACTIVE).set(count as f64);
}

pub fn record_sessions_reaped(count: usize) {
    metrics::counter!(SESSIONS_REAPED_TOTAL).increment(count as u64);
}
