//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shell_shutdowns_total` (counter): shutdowns by cause
//! - `shell_starts_total` (counter): shell runs started
//!
//! # Design Decisions
//! - Prometheus exporter installed from the telemetry hook, not by the core
//! - Recording without an installed recorder is a no-op

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::ShutdownCause;

/// Install the Prometheus recorder and its scrape endpoint at `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record that the shell started serving.
pub fn record_start() {
    ::metrics::counter!("shell_starts_total").increment(1);
}

/// Record a shutdown and its cause.
pub fn record_shutdown(cause: &ShutdownCause) {
    ::metrics::counter!("shell_shutdowns_total", "cause" => cause.as_label()).increment(1);
}
