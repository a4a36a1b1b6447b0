//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Group (group.rs):
//!     N actors → first to finish wins → interrupt the rest → wait for all
//!
//! Shell (shell.rs):
//!     Setup hooks → install signals → Group { server, signals }
//!         → classify → shutdown hook
//!
//! Server (server.rs):
//!     Interrupt → Shutdown(deadline) → ForceClose on failure
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT or StopHandle → terminal outcome
//! ```
//!
//! # Design Decisions
//! - Actors are fixed once a group starts
//! - Shutdown has a deadline: forced close after it elapses
//! - Only the first actor's outcome is reported

pub mod group;
pub mod server;
pub mod shell;
pub mod shutdown;
pub mod signals;

pub use group::{Actor, Group, GroupReport};
pub use server::Server;
pub use shell::{HookResult, LifecycleState, Shell, ShellHandler, ShellInfo};
pub use shutdown::ShutdownCause;
pub use signals::{ChannelSignals, OsSignals, SignalKind, SignalSource, StopHandle};
