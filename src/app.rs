//! Bundled demo application: a hello route plus lifecycle hooks wired to
//! the observability subsystem.

use std::net::SocketAddr;

use axum::{http::HeaderMap, routing::get, Extension, Router};

use crate::config::ObservabilityConfig;
use crate::http::{RequestScope, X_APPSHELL_ID};
use crate::lifecycle::{HookResult, ShellHandler, ShellInfo, ShutdownCause};
use crate::observability::{logging, metrics};

/// Application managed by the shell.
#[derive(Debug, Clone)]
pub struct App {
    observability: ObservabilityConfig,
}

impl App {
    pub fn new(observability: ObservabilityConfig) -> Self {
        Self { observability }
    }

    /// Routes served by the application.
    pub fn routes() -> Router {
        Router::new().route("/", get(hello))
    }
}

async fn hello(Extension(scope): Extension<RequestScope>, headers: HeaderMap) -> String {
    let shell_header = headers
        .get(X_APPSHELL_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    tracing::debug!(
        shell_header,
        scope_value = %scope.value,
        remaining = ?scope.remaining(),
        "Hello requested"
    );
    format!("hello from {}", scope.shell_id)
}

impl ShellHandler for App {
    fn handle_logging(&self, shell: &ShellInfo) -> HookResult {
        logging::init_logging(&self.observability.log_level);
        tracing::info!(server = %shell.server, "Logging ready");
        Ok(())
    }

    fn handle_telemetry(&self, shell: &ShellInfo) -> HookResult {
        if self.observability.metrics_enabled {
            let addr: SocketAddr = self.observability.metrics_address.parse()?;
            metrics::init_metrics(addr)?;
        }
        metrics::record_start();
        tracing::info!(server = %shell.server, grace = ?shell.grace, "Telemetry ready");
        Ok(())
    }

    fn handle_shutdown(&self, cause: &ShutdownCause) {
        metrics::record_shutdown(cause);
        if cause.is_error() {
            tracing::error!(cause = %cause, "Process is closing due to error");
        } else {
            tracing::info!(cause = %cause, "Process shut down");
        }
    }
}
