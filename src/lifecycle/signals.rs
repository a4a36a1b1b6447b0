//! Termination signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT/SIGTERM/SIGQUIT (Ctrl-C only on Windows)
//! - Accept internally raised stop requests, including the integrity kind
//! - Run the signal actor: resolve with the observed signal, or return
//!   quietly once interrupted
//!
//! # Design Decisions
//! - SIGSTOP cannot be caught by a process, so [`SignalKind::Integrity`] only
//!   arrives through a [`StopHandle`]
//! - OS handlers are installed before serving starts, so a signal that
//!   arrives while the server binds is still observed
//! - The signal actor is cancellable; when the server finishes first the
//!   listener is released instead of left blocked

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{Outcome, ShellError};
use crate::lifecycle::group::Actor;

/// The closed set of termination requests the shell reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGQUIT.
    Quit,
    /// The process was stopped under a stricter policy.
    Integrity,
}

impl SignalKind {
    pub fn is_integrity(self) -> bool {
        matches!(self, SignalKind::Integrity)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Interrupt => "interrupt",
            SignalKind::Terminate => "terminate",
            SignalKind::Quit => "quit",
            SignalKind::Integrity => "integrity",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that eventually yields a termination request.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Register with whatever delivers requests. Called before serving starts.
    fn install(&mut self) -> Result<(), ShellError> {
        Ok(())
    }

    /// Wait for the next termination request.
    async fn recv(&mut self) -> Result<SignalKind, ShellError>;
}

/// Raises termination requests from inside the process.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: mpsc::UnboundedSender<SignalKind>,
}

impl StopHandle {
    /// Create a handle and the internal-only source it feeds.
    pub fn channel() -> (Self, ChannelSignals) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, ChannelSignals { rx })
    }

    /// Request termination. Returns `false` if nothing is listening anymore.
    pub fn stop(&self, kind: SignalKind) -> bool {
        self.tx.send(kind).is_ok()
    }
}

/// Signal source fed only by [`StopHandle`]s.
///
/// Stays pending forever once every handle is dropped.
#[derive(Debug)]
pub struct ChannelSignals {
    rx: mpsc::UnboundedReceiver<SignalKind>,
}

#[async_trait]
impl SignalSource for ChannelSignals {
    async fn recv(&mut self) -> Result<SignalKind, ShellError> {
        match self.rx.recv().await {
            Some(kind) => Ok(kind),
            None => std::future::pending().await,
        }
    }
}

/// Operating system signals merged with internal stop requests.
#[derive(Debug)]
pub struct OsSignals {
    internal: ChannelSignals,
    installed: Option<Installed>,
}

impl OsSignals {
    /// Create the source along with a handle for internal stop requests.
    ///
    /// Nothing is registered with the OS until [`SignalSource::install`].
    pub fn new() -> (Self, StopHandle) {
        let (handle, internal) = StopHandle::channel();
        let signals = Self {
            internal,
            installed: None,
        };
        (signals, handle)
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    fn install(&mut self) -> Result<(), ShellError> {
        if self.installed.is_none() {
            let installed = Installed::register().map_err(|e| ShellError::SignalSource {
                error: e.to_string(),
            })?;
            self.installed = Some(installed);
            tracing::debug!("Signal handlers installed");
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<SignalKind, ShellError> {
        self.install()?;
        let Some(installed) = self.installed.as_mut() else {
            return self.internal.recv().await;
        };
        tokio::select! {
            kind = installed.recv() => Ok(kind),
            internal = self.internal.recv() => internal,
        }
    }
}

/// SIGINT, SIGTERM and SIGQUIT streams.
#[cfg(unix)]
#[derive(Debug)]
struct Installed {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Installed {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind as UnixSignal};

        Ok(Self {
            interrupt: signal(UnixSignal::interrupt())?,
            terminate: signal(UnixSignal::terminate())?,
            quit: signal(UnixSignal::quit())?,
        })
    }

    async fn recv(&mut self) -> SignalKind {
        tokio::select! {
            Some(()) = self.interrupt.recv() => SignalKind::Interrupt,
            Some(()) = self.terminate.recv() => SignalKind::Terminate,
            Some(()) = self.quit.recv() => SignalKind::Quit,
            else => std::future::pending().await,
        }
    }
}

/// Ctrl-C stream.
#[cfg(windows)]
#[derive(Debug)]
struct Installed {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl Installed {
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> SignalKind {
        match self.ctrl_c.recv().await {
            Some(()) => SignalKind::Interrupt,
            None => std::future::pending().await,
        }
    }
}

/// Actor that resolves when a termination request arrives.
pub(crate) struct SignalActor {
    source: Mutex<Box<dyn SignalSource>>,
    cancel: CancellationToken,
}

impl SignalActor {
    pub(crate) fn new(source: Box<dyn SignalSource>) -> Self {
        Self {
            source: Mutex::new(source),
            cancel: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl Actor for SignalActor {
    fn name(&self) -> &str {
        "signals"
    }

    async fn execute(&self) -> Outcome {
        let mut source = self.source.lock().await;
        tokio::select! {
            received = source.recv() => {
                let kind = received?;
                tracing::info!(signal = %kind, "Shutdown signal received");
                Err(ShellError::Signal { kind })
            }
            _ = self.cancel.cancelled() => {
                tracing::debug!("Signal listener released");
                Ok(())
            }
        }
    }

    async fn interrupt(&self, _cause: &Outcome) {
        self.cancel.cancel();
    }
}
