//! Cooperative runners for lists of asynchronous steps.
//!
//! A [`Sequence`] advances a list of [`PhaseStep`]s without ever blocking:
//! each call to [`Sequence::poll`] polls the outstanding work once with a
//! no-op waker and reports whether the whole list has completed. The host's
//! tick loop is the only scheduler.
//!
//! Steps that fail, or panic while launching or polling, are reported as
//! [`StepFailure`]s and otherwise treated as complete so a phase can always
//! make progress.

mod parallel;
mod sequential;

pub use parallel::Parallel;
pub use sequential::Sequential;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::task::{Context, Poll};

use futures::future::{self, FutureExt};
use futures::task::noop_waker_ref;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{ActivityError, ActivityFuture};

/// Outcome of a single step's work.
pub type StepResult = Result<(), ActivityError>;

/// One unit of asynchronous work inside a sequence.
///
/// `C` is the context the runner lends to the step while launching and
/// settling it.
pub trait PhaseStep<C>: Send {
    /// Label used in logs and failure reports.
    fn describe(&self) -> String;

    /// Start the work.
    fn launch(&mut self, ctx: &mut C) -> ActivityFuture;

    /// Called exactly once after the launched work has completed.
    fn settle(&mut self, ctx: &mut C, result: &StepResult);
}

/// A runner that drives a list of steps to completion across polls.
pub trait Sequence<C>: Send {
    /// Launch the initial work. Calling it again has no effect.
    fn start(&mut self, ctx: &mut C);

    /// Advance outstanding work once. Returns `true` when every step is done.
    ///
    /// Starts the sequence first if `start` was never called.
    fn poll(&mut self, ctx: &mut C) -> bool;

    /// Failures collected so far, leaving the internal list empty.
    fn take_failures(&mut self) -> Vec<StepFailure>;

    /// Number of steps in the sequence.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A step that terminated abnormally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    pub step: String,
    pub error: ActivityError,
}

/// How the steps of one phase are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceMode {
    /// One step in flight at a time, in list order.
    #[default]
    Sequential,
    /// Every step launched together.
    Parallel,
}

impl SequenceMode {
    /// Build a boxed runner of this mode over `steps`.
    pub fn build<C, S>(self, steps: Vec<S>) -> Box<dyn Sequence<C>>
    where
        C: 'static,
        S: PhaseStep<C> + 'static,
    {
        match self {
            Self::Sequential => Box::new(Sequential::new(steps)),
            Self::Parallel => Box::new(Parallel::new(steps)),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Launch a step, converting a panic into already-failed work.
pub(crate) fn launch_step<C, S: PhaseStep<C>>(step: &mut S, ctx: &mut C) -> ActivityFuture {
    match catch_unwind(AssertUnwindSafe(|| step.launch(ctx))) {
        Ok(work) => work,
        Err(payload) => {
            future::ready(Err(ActivityError::Panicked(panic_message(payload)))).boxed()
        }
    }
}

/// Poll work once with a no-op waker. A panic resolves the work as failed.
pub(crate) fn poll_step(work: &mut ActivityFuture) -> Poll<StepResult> {
    let mut cx = Context::from_waker(noop_waker_ref());
    match catch_unwind(AssertUnwindSafe(|| work.poll_unpin(&mut cx))) {
        Ok(poll) => poll,
        Err(payload) => Poll::Ready(Err(ActivityError::Panicked(panic_message(payload)))),
    }
}

/// Settle a completed step and record its failure, if any.
pub(crate) fn finish_step<C, S: PhaseStep<C>>(
    step: &mut S,
    ctx: &mut C,
    result: StepResult,
    failures: &mut Vec<StepFailure>,
) {
    step.settle(ctx, &result);
    if let Err(error) = result {
        let label = step.describe();
        warn!(step = %label, %error, "step failed, treating as complete");
        failures.push(StepFailure { step: label, error });
    }
}
