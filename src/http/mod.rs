//! HTTP server collaborator.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, graceful/forced stop)
//!     → TraceLayer → TimeoutLayer (per-request deadline)
//!     → request.rs (X-APPSHELL-ID header, RequestScope extension)
//!     → caller's routes
//! ```

pub mod request;
pub mod server;

pub use request::{RequestScope, X_APPSHELL_ID};
pub use server::HttpServer;
