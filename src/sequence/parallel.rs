//! Every step outstanding at once.

use std::task::Poll;

use super::{finish_step, launch_step, poll_step, PhaseStep, Sequence, StepFailure};
use crate::core::ActivityFuture;

/// Launches every step on `start` and completes when all of them have.
///
/// "Parallel" means concurrently outstanding cooperative work on the tick
/// thread, not multi-core execution.
pub struct Parallel<S> {
    steps: Vec<S>,
    in_flight: Vec<Option<ActivityFuture>>,
    started: bool,
    failures: Vec<StepFailure>,
}

impl<S> Parallel<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self {
            steps,
            in_flight: Vec::new(),
            started: false,
            failures: Vec::new(),
        }
    }

    /// Steps whose work has not completed yet.
    pub fn outstanding(&self) -> usize {
        self.in_flight.iter().filter(|work| work.is_some()).count()
    }
}

impl<C, S: PhaseStep<C>> Sequence<C> for Parallel<S> {
    fn start(&mut self, ctx: &mut C) {
        if self.started {
            return;
        }
        self.started = true;
        self.in_flight = self
            .steps
            .iter_mut()
            .map(|step| Some(launch_step(step, ctx)))
            .collect();
    }

    fn poll(&mut self, ctx: &mut C) -> bool {
        self.start(ctx);
        for (step, slot) in self.steps.iter_mut().zip(self.in_flight.iter_mut()) {
            let Some(work) = slot.as_mut() else {
                continue;
            };
            if let Poll::Ready(result) = poll_step(work) {
                *slot = None;
                finish_step(step, ctx, result, &mut self.failures);
            }
        }
        self.outstanding() == 0
    }

    fn take_failures(&mut self) -> Vec<StepFailure> {
        std::mem::take(&mut self.failures)
    }

    fn len(&self) -> usize {
        self.steps.len()
    }
}
