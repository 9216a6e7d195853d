//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count records, bytes, rotations and failures per destination
//! - Track how many writers are open
//! - Expose a Prometheus-compatible endpoint when asked to
//!
//! # Metrics
//! - `log_sink_records_written_total` (counter): records appended, by destination
//! - `log_sink_bytes_written_total` (counter): bytes appended, by destination
//! - `log_sink_rotations_total` (counter): rotations, by reason
//! - `log_sink_write_errors_total` (counter): failed writes, by destination
//! - `log_sink_open_writers` (gauge): writers currently holding a handle
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Destination label is the writer's base path

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_write(destination: &str, bytes: usize) {
    counter!("log_sink_records_written_total", "destination" => destination.to_string()).increment(1);
    counter!("log_sink_bytes_written_total", "destination" => destination.to_string())
        .increment(bytes as u64);
}

pub fn record_write_error(destination: &str) {
    counter!("log_sink_write_errors_total", "destination" => destination.to_string()).increment(1);
}

pub fn record_rotation(reason: &str) {
    counter!("log_sink_rotations_total", "reason" => reason.to_string()).increment(1);
}

pub fn writer_opened() {
    gauge!("log_sink_open_writers").increment(1.0);
}

pub fn writer_closed() {
    gauge!("log_sink_open_writers").decrement(1.0);
}
