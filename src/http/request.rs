//! Request scope injection.
//!
//! # Responsibilities
//! - Add the `X-APPSHELL-ID` header to every incoming request
//! - Attach a typed [`RequestScope`] to the request extensions
//!
//! # Design Decisions
//! - Scope values travel as an explicit typed extension, extracted with
//!   `Extension<RequestScope>`; nothing is looked up by an opaque key
//! - The scope carries the same deadline the timeout layer enforces

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::config::RequestConfig;

/// Header added to every request that passes through the shell.
pub const X_APPSHELL_ID: &str = "x-appshell-id";

/// Values the shell hands to every request.
#[derive(Debug, Clone)]
pub struct RequestScope {
    /// Identifier of the shell that accepted the request.
    pub shell_id: String,
    /// Configured shell value.
    pub value: String,
    /// Point after which the request is timed out.
    pub deadline: Instant,
}

impl RequestScope {
    /// Time left before the request deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Per-server template from which each request's scope is stamped.
#[derive(Debug, Clone)]
pub struct ScopeTemplate {
    shell_id: String,
    header: Option<HeaderValue>,
    value: String,
    timeout: Duration,
}

impl ScopeTemplate {
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            shell_id: config.shell_id.clone(),
            header: HeaderValue::from_str(&config.shell_id).ok(),
            value: config.scope_value.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn stamp(&self) -> RequestScope {
        RequestScope {
            shell_id: self.shell_id.clone(),
            value: self.value.clone(),
            deadline: Instant::now() + self.timeout,
        }
    }
}

/// Middleware adding the shell header and request scope.
pub async fn attach_scope(
    State(template): State<Arc<ScopeTemplate>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(header) = &template.header {
        request.headers_mut().append(X_APPSHELL_ID, header.clone());
    }
    request.extensions_mut().insert(template.stamp());
    next.run(request).await
}
