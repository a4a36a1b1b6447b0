//! Error taxonomy for the shell and its actors.
//!
//! Every actor resolves to an [`Outcome`]. The error side is [`ShellError`],
//! which is `Clone` so a single terminal outcome can be handed to every
//! interrupted actor and still be returned to the caller.

use std::time::Duration;
use thiserror::Error;

use crate::lifecycle::signals::SignalKind;

/// Terminal result of an actor's `execute`.
pub type Outcome = Result<(), ShellError>;

/// Errors produced by the shell, its actor group and the managed server.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The server could not bind or otherwise begin serving.
    #[error("server failed to start: {error}")]
    ServerStart { error: String },

    /// The server stopped with an error after it started serving.
    #[error("server failed while running: {error}")]
    ServerRuntime { error: String },

    /// Graceful drain did not complete before its deadline.
    #[error("graceful shutdown did not complete within {grace:?}")]
    GracefulShutdownTimeout { grace: Duration },

    /// Forcibly closing the server failed.
    #[error("forced close failed: {error}")]
    ForcedClose { error: String },

    /// The group or shell was misused (no actors, started twice, ...).
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// A termination signal was observed.
    #[error("received {kind} signal")]
    Signal { kind: SignalKind },

    /// Signal handlers could not be installed.
    #[error("failed to listen for signals: {error}")]
    SignalSource { error: String },

    /// A caller-supplied lifecycle hook returned an error.
    #[error("lifecycle hook `{hook}` failed: {error}")]
    Hook { hook: &'static str, error: String },

    /// An actor panicked inside `execute`.
    #[error("actor `{actor}` panicked: {info}")]
    ActorPanicked { actor: String, info: String },
}

impl ShellError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        ShellError::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShellError::ServerStart { .. } => "server_start_failure",
            ShellError::ServerRuntime { .. } => "server_runtime_failure",
            ShellError::GracefulShutdownTimeout { .. } => "graceful_shutdown_timeout",
            ShellError::ForcedClose { .. } => "forced_close_failure",
            ShellError::Configuration { .. } => "configuration_error",
            ShellError::Signal { .. } => "signal",
            ShellError::SignalSource { .. } => "signal_source_failure",
            ShellError::Hook { .. } => "hook_failure",
            ShellError::ActorPanicked { .. } => "actor_panicked",
        }
    }

    /// The signal kind carried by a [`ShellError::Signal`], if any.
    pub fn signal_kind(&self) -> Option<SignalKind> {
        match self {
            ShellError::Signal { kind } => Some(*kind),
            _ => None,
        }
    }
}
