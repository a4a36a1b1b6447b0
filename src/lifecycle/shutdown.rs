//! Shutdown cause classification.

use crate::error::{Outcome, ShellError};
use crate::lifecycle::signals::SignalKind;

/// Why the process is stopping. Delivered to the shutdown hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A termination request arrived and the server drained cleanly.
    RequestedSignal(SignalKind),
    /// The process was stopped by an integrity-type signal.
    IntegritySignal,
    /// The server stopped on its own with an error.
    ServerError(ShellError),
    /// A termination request arrived but the graceful drain failed.
    GracefulShutdownFailed(ShellError),
    /// Listening for signals failed.
    SignalSourceFailed(ShellError),
    /// The server returned cleanly on its own.
    ServerStopped,
}

/// Which actor resolved the group first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Initiator {
    Server,
    Signals,
}

impl ShutdownCause {
    /// Classify the terminal outcome of a shell run.
    ///
    /// `drain` is the graceful-shutdown verdict, present only when the
    /// server was interrupted. An integrity signal takes precedence over a
    /// failed drain.
    pub(crate) fn classify(
        initiator: Initiator,
        outcome: &Outcome,
        drain: Option<&Outcome>,
    ) -> Self {
        match (initiator, outcome) {
            (Initiator::Server, Ok(())) => ShutdownCause::ServerStopped,
            (Initiator::Server, Err(err)) => ShutdownCause::ServerError(err.clone()),
            (Initiator::Signals, Err(ShellError::Signal { kind })) if kind.is_integrity() => {
                ShutdownCause::IntegritySignal
            }
            (Initiator::Signals, Err(ShellError::Signal { kind })) => match drain {
                Some(Err(err)) => ShutdownCause::GracefulShutdownFailed(err.clone()),
                _ => ShutdownCause::RequestedSignal(*kind),
            },
            (Initiator::Signals, Err(err)) => ShutdownCause::SignalSourceFailed(err.clone()),
            // the signal actor only returns Ok once interrupted
            (Initiator::Signals, Ok(())) => ShutdownCause::ServerStopped,
        }
    }

    /// Whether this cause should be treated as a failure.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            ShutdownCause::RequestedSignal(_) | ShutdownCause::ServerStopped
        )
    }

    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownCause::RequestedSignal(_) => "requested_signal",
            ShutdownCause::IntegritySignal => "integrity_signal",
            ShutdownCause::ServerError(_) => "server_error",
            ShutdownCause::GracefulShutdownFailed(_) => "graceful_shutdown_failed",
            ShutdownCause::SignalSourceFailed(_) => "signal_source_failed",
            ShutdownCause::ServerStopped => "server_stopped",
        }
    }
}

impl std::fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownCause::RequestedSignal(kind) => write!(f, "stopped on {kind} signal"),
            ShutdownCause::IntegritySignal => write!(f, "integrity issue caused shutdown"),
            ShutdownCause::ServerError(err) => write!(f, "server error: {err}"),
            ShutdownCause::GracefulShutdownFailed(err) => {
                write!(f, "server was not stopped gracefully: {err}")
            }
            ShutdownCause::SignalSourceFailed(err) => write!(f, "{err}"),
            ShutdownCause::ServerStopped => write!(f, "server stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn signal(kind: SignalKind) -> Outcome {
        Err(ShellError::Signal { kind })
    }

    #[test]
    fn clean_drain_is_requested_signal() {
        let cause = ShutdownCause::classify(
            Initiator::Signals,
            &signal(SignalKind::Terminate),
            Some(&Ok(())),
        );
        assert_eq!(cause, ShutdownCause::RequestedSignal(SignalKind::Terminate));
        assert!(!cause.is_error());
    }

    #[test]
    fn failed_drain_is_reported() {
        let timeout = ShellError::GracefulShutdownTimeout {
            grace: Duration::from_secs(10),
        };
        let cause = ShutdownCause::classify(
            Initiator::Signals,
            &signal(SignalKind::Interrupt),
            Some(&Err(timeout.clone())),
        );
        assert_eq!(cause, ShutdownCause::GracefulShutdownFailed(timeout));
        assert!(cause.is_error());
    }

    #[test]
    fn integrity_wins_over_failed_drain() {
        let cause = ShutdownCause::classify(
            Initiator::Signals,
            &signal(SignalKind::Integrity),
            Some(&Err(ShellError::ServerRuntime {
                error: "shutdown failed".into(),
            })),
        );
        assert_eq!(cause, ShutdownCause::IntegritySignal);
    }

    #[test]
    fn server_initiated_outcomes() {
        let bind = ShellError::ServerStart {
            error: "bind error".into(),
        };
        assert_eq!(
            ShutdownCause::classify(Initiator::Server, &Err(bind.clone()), None),
            ShutdownCause::ServerError(bind)
        );
        assert_eq!(
            ShutdownCause::classify(Initiator::Server, &Ok(()), None),
            ShutdownCause::ServerStopped
        );
    }
}
