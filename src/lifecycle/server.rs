//! The server collaborator and the actor that drives it.
//!
//! # Responsibilities
//! - Define the contract a managed server exposes: serve, graceful shutdown
//!   against a deadline, forced close
//! - Run the server as an actor; on interrupt, drain it within the grace
//!   period and escalate to a forced close when draining fails
//!
//! # Design Decisions
//! - The deadline is enforced here as well, so a server that ignores it
//!   still cannot hold up shutdown past the grace period
//! - Forced close failures are logged, never escalated

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{Outcome, ShellError};
use crate::lifecycle::group::Actor;
use crate::lifecycle::shell::LifecycleState;

/// A long-running network service managed by the shell.
///
/// The server exclusively owns its listening resource.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        "server"
    }

    /// Serve until the server stops on its own or is asked to stop.
    async fn serve(&self) -> Outcome;

    /// Stop accepting new work and drain in-flight work before `deadline`.
    async fn shutdown(&self, deadline: Instant) -> Outcome;

    /// Release the listening resource immediately.
    async fn force_close(&self) -> Outcome;
}

/// Furthest deadline a drain will use, roughly thirty years out.
const MAX_GRACE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + grace`, capped so an oversized grace cannot overflow the clock.
fn drain_deadline(now: Instant, grace: Duration) -> Instant {
    now.checked_add(grace.min(MAX_GRACE)).unwrap_or(now)
}

/// Actor wrapping a [`Server`] with the graceful-shutdown policy.
pub(crate) struct ServerActor {
    server: Arc<dyn Server>,
    grace: Duration,
    /// Verdict of the graceful drain, set once when interrupted.
    drain: Arc<OnceLock<Outcome>>,
    state: Arc<watch::Sender<LifecycleState>>,
}

impl ServerActor {
    pub(crate) fn new(
        server: Arc<dyn Server>,
        grace: Duration,
        drain: Arc<OnceLock<Outcome>>,
        state: Arc<watch::Sender<LifecycleState>>,
    ) -> Self {
        Self {
            server,
            grace,
            drain,
            state,
        }
    }

    /// Graceful shutdown bounded by `grace`, escalating to a forced close.
    async fn drain(&self) -> Outcome {
        let deadline = drain_deadline(Instant::now(), self.grace);
        let shutdown = self.server.shutdown(deadline);
        let drained = match tokio::time::timeout_at(deadline, shutdown).await {
            Ok(result) => result,
            Err(_) => Err(ShellError::GracefulShutdownTimeout { grace: self.grace }),
        };

        if let Err(err) = &drained {
            tracing::warn!(
                server = self.server.name(),
                error = %err,
                "Graceful shutdown failed, forcing close"
            );
            if let Err(close_err) = self.server.force_close().await {
                tracing::error!(
                    server = self.server.name(),
                    error = %close_err,
                    "Forced close failed"
                );
            }
        }
        drained
    }
}

#[async_trait]
impl Actor for ServerActor {
    fn name(&self) -> &str {
        self.server.name()
    }

    async fn execute(&self) -> Outcome {
        self.server.serve().await
    }

    async fn interrupt(&self, cause: &Outcome) {
        self.state.send_replace(LifecycleState::Draining);
        tracing::info!(
            server = self.server.name(),
            cause = ?cause,
            grace = ?self.grace,
            "Draining server"
        );
        let drained = self.drain().await;
        if drained.is_ok() {
            tracing::info!(server = self.server.name(), "Server drained gracefully");
        }
        let _ = self.drain.set(drained);
    }
}
