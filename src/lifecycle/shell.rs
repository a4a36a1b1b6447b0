//! The lifecycle orchestrator.
//!
//! # Data Flow
//! ```text
//! Shell::start(handler)
//!     → handler.handle_logging → handler.handle_telemetry       (Idle)
//!     → signal source installed
//!     → Group { server actor, signal actor }.run()              (Running)
//!         signal first  → server.shutdown(deadline) → force_close on failure
//!         server first  → signal listener released
//!     → classify ShutdownCause                                  (Draining)
//!     → handler.handle_shutdown(cause)                          (Stopped)
//!     → terminal outcome back to the caller
//! ```
//!
//! A shell is single-use: a second `start` is rejected.

use std::error::Error;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Outcome, ShellError};
use crate::lifecycle::group::Group;
use crate::lifecycle::server::{Server, ServerActor};
use crate::lifecycle::shutdown::{Initiator, ShutdownCause};
use crate::lifecycle::signals::{OsSignals, SignalActor, SignalSource, StopHandle};

/// Result of a setup hook.
pub type HookResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Lifecycle callbacks a managed application must supply.
///
/// There are no default implementations; every hook is required.
pub trait ShellHandler: Send + Sync {
    /// Called once before the server starts, to set up logging.
    fn handle_logging(&self, shell: &ShellInfo) -> HookResult;

    /// Called once after logging setup, to set up telemetry.
    fn handle_telemetry(&self, shell: &ShellInfo) -> HookResult;

    /// Called exactly once after every actor has returned.
    fn handle_shutdown(&self, cause: &ShutdownCause);
}

/// What setup hooks get to see of the shell.
#[derive(Debug, Clone)]
pub struct ShellInfo {
    pub server: String,
    pub grace: Duration,
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Draining,
    Stopped,
}

const SERVER_ACTOR: usize = 0;

/// Runs a server until it exits or a termination request arrives.
pub struct Shell {
    server: Arc<dyn Server>,
    signals: Option<Box<dyn SignalSource>>,
    stop: Option<StopHandle>,
    grace: Duration,
    state: Arc<watch::Sender<LifecycleState>>,
    cause: Option<ShutdownCause>,
}

impl Shell {
    /// Shell listening to operating system signals.
    pub fn new(server: Arc<dyn Server>, grace: Duration) -> Self {
        let (signals, stop) = OsSignals::new();
        let mut shell = Self::with_signals(server, signals, grace);
        shell.stop = Some(stop);
        shell
    }

    /// Shell listening to a caller-provided signal source.
    pub fn with_signals(
        server: Arc<dyn Server>,
        signals: impl SignalSource,
        grace: Duration,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            server,
            signals: Some(Box::new(signals)),
            stop: None,
            grace,
            state: Arc::new(state),
            cause: None,
        }
    }

    /// Handle for raising termination requests from inside the process.
    ///
    /// Only available for shells built with [`Shell::new`].
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.stop.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Why the last run stopped. `None` until a run reaches its shutdown hook.
    pub fn cause(&self) -> Option<&ShutdownCause> {
        self.cause.as_ref()
    }

    fn info(&self) -> ShellInfo {
        ShellInfo {
            server: self.server.name().to_string(),
            grace: self.grace,
        }
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "Lifecycle state changed");
        }
    }

    /// Run the server under the shell until it stops.
    ///
    /// Setup hook errors are returned as [`ShellError::Hook`] before the
    /// server starts; the shutdown hook is not called in that case. The
    /// same holds when the signal source cannot be installed.
    pub async fn start(&mut self, handler: &dyn ShellHandler) -> Outcome {
        let Some(mut signals) = self.signals.take() else {
            return Err(ShellError::configuration("shell has already been started"));
        };

        let info = self.info();
        handler.handle_logging(&info).map_err(|e| ShellError::Hook {
            hook: "logging",
            error: e.to_string(),
        })?;
        handler.handle_telemetry(&info).map_err(|e| ShellError::Hook {
            hook: "telemetry",
            error: e.to_string(),
        })?;
        signals.install()?;

        let drain = Arc::new(OnceLock::new());
        let mut group = Group::new();
        group.add(ServerActor::new(
            Arc::clone(&self.server),
            self.grace,
            Arc::clone(&drain),
            Arc::clone(&self.state),
        ))?;
        group.add(SignalActor::new(signals))?;

        tracing::info!(server = %info.server, grace = ?self.grace, "Shell starting");
        self.transition(LifecycleState::Running);
        let report = group.run_report().await?;
        self.transition(LifecycleState::Draining);

        let initiator = if report.initiator == SERVER_ACTOR {
            Initiator::Server
        } else {
            Initiator::Signals
        };
        let cause = ShutdownCause::classify(initiator, &report.outcome, drain.get());
        if cause.is_error() {
            tracing::warn!(cause = %cause, "Shell stopping");
        } else {
            tracing::info!(cause = %cause, "Shell stopping");
        }

        handler.handle_shutdown(&cause);
        self.cause = Some(cause);
        self.transition(LifecycleState::Stopped);
        report.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::signals::{SignalKind, StopHandle};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_logging: bool,
    }

    impl ShellHandler for Recorder {
        fn handle_logging(&self, _shell: &ShellInfo) -> HookResult {
            self.calls.lock().unwrap().push("logging".into());
            if self.fail_logging {
                return Err("no log sink".into());
            }
            Ok(())
        }

        fn handle_telemetry(&self, _shell: &ShellInfo) -> HookResult {
            self.calls.lock().unwrap().push("telemetry".into());
            Ok(())
        }

        fn handle_shutdown(&self, cause: &ShutdownCause) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("shutdown:{}", cause.as_label()));
        }
    }

    /// Serves until shut down.
    #[derive(Default)]
    struct Forever {
        stopped: CancellationToken,
    }

    #[async_trait]
    impl Server for Forever {
        async fn serve(&self) -> Outcome {
            self.stopped.cancelled().await;
            Ok(())
        }

        async fn shutdown(&self, _deadline: Instant) -> Outcome {
            self.stopped.cancel();
            Ok(())
        }

        async fn force_close(&self) -> Outcome {
            self.stopped.cancel();
            Ok(())
        }
    }

    fn forever_shell(signals: impl SignalSource) -> Shell {
        Shell::with_signals(Arc::new(Forever::default()), signals, Duration::from_secs(1))
    }

    /// Source whose handlers can never be installed.
    struct Uninstallable;

    #[async_trait]
    impl SignalSource for Uninstallable {
        fn install(&mut self) -> Result<(), ShellError> {
            Err(ShellError::SignalSource {
                error: "no signal support".into(),
            })
        }

        async fn recv(&mut self) -> Result<SignalKind, ShellError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn hooks_run_in_order_and_shutdown_once() {
        let (stop, signals) = StopHandle::channel();
        let mut shell = forever_shell(signals);
        let recorder = Recorder::default();
        assert_eq!(shell.state(), LifecycleState::Idle);

        stop.stop(SignalKind::Interrupt);
        let outcome = shell.start(&recorder).await;

        assert_eq!(outcome.unwrap_err().signal_kind(), Some(SignalKind::Interrupt));
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["logging", "telemetry", "shutdown:requested_signal"]
        );
        assert_eq!(shell.state(), LifecycleState::Stopped);
        assert_eq!(
            shell.cause(),
            Some(&ShutdownCause::RequestedSignal(SignalKind::Interrupt))
        );
    }

    #[tokio::test]
    async fn uninstallable_signal_source_stops_before_serving() {
        let mut shell = forever_shell(Uninstallable);
        let recorder = Recorder::default();

        let err = shell.start(&recorder).await.unwrap_err();
        assert!(matches!(err, ShellError::SignalSource { .. }));
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["logging", "telemetry"]);
        assert_eq!(shell.state(), LifecycleState::Idle);
        assert_eq!(shell.cause(), None);
    }

    #[tokio::test]
    async fn setup_hook_error_stops_before_serving() {
        let (_stop, signals) = StopHandle::channel();
        let mut shell = forever_shell(signals);
        let recorder = Recorder {
            fail_logging: true,
            ..Default::default()
        };

        let err = shell.start(&recorder).await.unwrap_err();
        assert!(matches!(err, ShellError::Hook { hook: "logging", .. }));
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["logging"]);
        assert_eq!(shell.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn shell_is_single_use() {
        let (stop, signals) = StopHandle::channel();
        let mut shell = forever_shell(signals);
        let recorder = Recorder::default();
        stop.stop(SignalKind::Quit);
        let _ = shell.start(&recorder).await;

        let err = shell.start(&recorder).await.unwrap_err();
        assert!(matches!(err, ShellError::Configuration { .. }));
        assert_eq!(recorder.calls.lock().unwrap().len(), 3);
    }
}
