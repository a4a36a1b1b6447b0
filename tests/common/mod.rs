//! Shared mock servers and handlers for lifecycle tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use svc_shell::lifecycle::{HookResult, Server, ShellHandler, ShellInfo, ShutdownCause};
use svc_shell::{Outcome, ShellError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How the mock server behaves when asked to shut down.
#[derive(Debug, Clone)]
pub enum DrainBehavior {
    /// Stop immediately.
    Clean,
    /// Return this error without stopping.
    Fail(ShellError),
    /// Never finish draining.
    Hang,
}

/// Scriptable server recording every lifecycle call.
pub struct MockServer {
    /// Returned from `serve` right away instead of running.
    pub immediate: Option<Outcome>,
    pub drain: DrainBehavior,
    /// Returned from `force_close` after the listener is torn down.
    pub close_error: Option<ShellError>,
    pub stopped: CancellationToken,
    pub serves: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub force_closes: AtomicUsize,
}

impl MockServer {
    pub fn running(drain: DrainBehavior) -> Self {
        Self {
            immediate: None,
            drain,
            close_error: None,
            stopped: CancellationToken::new(),
            serves: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            force_closes: AtomicUsize::new(0),
        }
    }

    pub fn exiting(outcome: Outcome) -> Self {
        Self {
            immediate: Some(outcome),
            ..Self::running(DrainBehavior::Clean)
        }
    }

    pub fn failing_close(drain: DrainBehavior, error: ShellError) -> Self {
        Self {
            close_error: Some(error),
            ..Self::running(drain)
        }
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn force_closes(&self) -> usize {
        self.force_closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Server for MockServer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn serve(&self) -> Outcome {
        self.serves.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = &self.immediate {
            return outcome.clone();
        }
        self.stopped.cancelled().await;
        Ok(())
    }

    async fn shutdown(&self, _deadline: Instant) -> Outcome {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        match &self.drain {
            DrainBehavior::Clean => {
                self.stopped.cancel();
                Ok(())
            }
            DrainBehavior::Fail(err) => Err(err.clone()),
            DrainBehavior::Hang => std::future::pending().await,
        }
    }

    async fn force_close(&self) -> Outcome {
        self.force_closes.fetch_add(1, Ordering::SeqCst);
        self.stopped.cancel();
        match &self.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Handler recording hook calls in order.
#[derive(Default)]
pub struct RecordingHandler {
    pub calls: Mutex<Vec<&'static str>>,
    pub causes: Mutex<Vec<ShutdownCause>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn causes(&self) -> Vec<ShutdownCause> {
        self.causes.lock().unwrap().clone()
    }
}

impl ShellHandler for RecordingHandler {
    fn handle_logging(&self, _shell: &ShellInfo) -> HookResult {
        self.calls.lock().unwrap().push("logging");
        Ok(())
    }

    fn handle_telemetry(&self, _shell: &ShellInfo) -> HookResult {
        self.calls.lock().unwrap().push("telemetry");
        Ok(())
    }

    fn handle_shutdown(&self, cause: &ShutdownCause) {
        self.calls.lock().unwrap().push("shutdown");
        self.causes.lock().unwrap().push(cause.clone());
    }
}

pub const GRACE: Duration = Duration::from_secs(10);
