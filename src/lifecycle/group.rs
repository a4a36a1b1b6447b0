//! Actor group: run a fixed set of actors until the first one finishes.
//!
//! # Data Flow
//! ```text
//! run()
//!     → spawn execute() of every actor (independent tokio tasks)
//!     → first execute() to return is the initiator; its result is the terminal outcome
//!     → interrupt(&terminal) on every other actor, once, in registration order
//!     → wait for all remaining execute() calls (their results are recorded, not reported)
//!     → return terminal outcome
//! ```
//!
//! # Design Decisions
//! - Actors are registered before `run` and never after
//! - A group runs at most once; zero actors is a configuration error
//! - A panicking `execute` resolves as [`ShellError::ActorPanicked`]

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::error::{Outcome, ShellError};

/// A unit of concurrent work: something to run, and a way to ask it to stop.
#[async_trait]
pub trait Actor: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        "actor"
    }

    /// Runs until natural completion or until interrupted.
    async fn execute(&self) -> Outcome;

    /// Best-effort request to make [`Actor::execute`] return promptly.
    ///
    /// Called at most once, with the outcome of the actor that finished first.
    async fn interrupt(&self, cause: &Outcome);
}

/// Closure-backed actor built by [`Group::add_fn`].
struct FnActor<E, I> {
    name: String,
    execute: E,
    interrupt: I,
}

#[async_trait]
impl<E, Fut, I> Actor for FnActor<E, I>
where
    E: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
    I: Fn(&Outcome) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Outcome {
        (self.execute)().await
    }

    async fn interrupt(&self, cause: &Outcome) {
        (self.interrupt)(cause)
    }
}

/// Everything a finished group run knows.
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Outcome of the initiator.
    pub outcome: Outcome,
    /// Registration index of the actor that returned first.
    pub initiator: usize,
    /// Every actor's own outcome, in registration order.
    pub outcomes: Vec<Outcome>,
}

/// An ordered set of actors run to quiescence together.
#[derive(Default)]
pub struct Group {
    actors: Vec<Arc<dyn Actor>>,
    started: bool,
}

impl Group {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor. Fails once the group has started.
    pub fn add<A: Actor>(&mut self, actor: A) -> Result<(), ShellError> {
        self.add_shared(Arc::new(actor))
    }

    /// Register an already shared actor.
    pub fn add_shared(&mut self, actor: Arc<dyn Actor>) -> Result<(), ShellError> {
        if self.started {
            return Err(ShellError::configuration(
                "cannot add an actor to a group that has already run",
            ));
        }
        self.actors.push(actor);
        Ok(())
    }

    /// Register an `execute`/`interrupt` closure pair.
    pub fn add_fn<E, Fut, I>(
        &mut self,
        name: impl Into<String>,
        execute: E,
        interrupt: I,
    ) -> Result<(), ShellError>
    where
        E: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
        I: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.add(FnActor {
            name: name.into(),
            execute,
            interrupt,
        })
    }

    /// Run every actor and return the initiator's outcome.
    pub async fn run(&mut self) -> Outcome {
        self.run_report().await?.outcome
    }

    /// Run every actor and return the full report.
    ///
    /// The outer `Err` is reserved for misuse (no actors, second run);
    /// actor failures are carried inside the report.
    pub async fn run_report(&mut self) -> Result<GroupReport, ShellError> {
        if self.started {
            return Err(ShellError::configuration("actor group already ran"));
        }
        if self.actors.is_empty() {
            return Err(ShellError::configuration("actor group has no actors"));
        }
        self.started = true;

        let mut set = JoinSet::new();
        for (index, actor) in self.actors.iter().enumerate() {
            let actor = Arc::clone(actor);
            set.spawn(async move {
                let outcome = match AssertUnwindSafe(actor.execute()).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(ShellError::ActorPanicked {
                        actor: actor.name().to_string(),
                        info: panic_info(panic.as_ref()),
                    }),
                };
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Outcome>> = vec![None; self.actors.len()];
        let Some((initiator, outcome)) = next_finished(&mut set).await else {
            return Err(ShellError::configuration(
                "actor group lost every actor before one finished",
            ));
        };
        outcomes[initiator] = Some(outcome.clone());

        tracing::debug!(
            initiator = self.actors[initiator].name(),
            outcome = ?outcome,
            "Actor finished first, interrupting the rest"
        );

        for (index, actor) in self.actors.iter().enumerate() {
            if index == initiator {
                continue;
            }
            tracing::debug!(actor = actor.name(), "Interrupting actor");
            actor.interrupt(&outcome).await;
        }

        while let Some((index, finished)) = next_finished(&mut set).await {
            tracing::trace!(
                actor = self.actors[index].name(),
                outcome = ?finished,
                "Actor drained"
            );
            outcomes[index] = Some(finished);
        }

        Ok(GroupReport {
            outcome,
            initiator,
            outcomes: outcomes
                .into_iter()
                .map(|o| {
                    o.unwrap_or_else(|| {
                        Err(ShellError::configuration("actor task was cancelled"))
                    })
                })
                .collect(),
        })
    }
}

/// Next `(index, outcome)` from the set, skipping tasks the runtime cancelled.
async fn next_finished(set: &mut JoinSet<(usize, Outcome)>) -> Option<(usize, Outcome)> {
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(finished) => return Some(finished),
            Err(err) => tracing::warn!(error = %err, "Actor task was cancelled"),
        }
    }
    None
}

fn panic_info(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
