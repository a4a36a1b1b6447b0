//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle hooks:
//!     handle_logging   → logging.rs (tracing subscriber)
//!     handle_telemetry → metrics.rs (Prometheus recorder)
//!     handle_shutdown  → metrics.rs (shutdown counter)
//! ```

pub mod logging;
pub mod metrics;
