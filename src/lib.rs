//! Process lifecycle shell for long-running network services.
//!
//! A [`Shell`] runs a [`Server`] next to a signal listener inside an actor
//! [`Group`]. Whichever finishes first interrupts the other; the server gets
//! a bounded graceful shutdown, and the classified [`ShutdownCause`] is
//! handed to the caller's [`ShellHandler`].

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ShellConfig;
pub use error::{Outcome, ShellError};
pub use http::HttpServer;
pub use lifecycle::{
    Actor, Group, LifecycleState, Server, Shell, ShellHandler, ShutdownCause, SignalKind,
    StopHandle,
};
