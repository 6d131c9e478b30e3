//! One step in flight at a time.

use std::task::Poll;

use super::{finish_step, launch_step, poll_step, PhaseStep, Sequence, StepFailure};
use crate::core::ActivityFuture;

/// Runs steps strictly in list order.
///
/// The next step is launched only after the current one completes. Steps
/// that complete immediately are chained within the same poll.
pub struct Sequential<S> {
    steps: Vec<S>,
    index: usize,
    in_flight: Option<ActivityFuture>,
    started: bool,
    failures: Vec<StepFailure>,
}

impl<S> Sequential<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self {
            steps,
            index: 0,
            in_flight: None,
            started: false,
            failures: Vec::new(),
        }
    }

    /// Index of the step currently in flight (or `len` once done).
    pub fn position(&self) -> usize {
        self.index
    }

    fn launch_current<C>(&mut self, ctx: &mut C)
    where
        S: PhaseStep<C>,
    {
        if let Some(step) = self.steps.get_mut(self.index) {
            self.in_flight = Some(launch_step(step, ctx));
        }
    }
}

impl<C, S: PhaseStep<C>> Sequence<C> for Sequential<S> {
    fn start(&mut self, ctx: &mut C) {
        if self.started {
            return;
        }
        self.started = true;
        self.launch_current(ctx);
    }

    fn poll(&mut self, ctx: &mut C) -> bool {
        self.start(ctx);
        loop {
            let Some(work) = self.in_flight.as_mut() else {
                return self.index >= self.steps.len();
            };
            let Poll::Ready(result) = poll_step(work) else {
                return false;
            };
            self.in_flight = None;
            finish_step(&mut self.steps[self.index], ctx, result, &mut self.failures);
            self.index += 1;
            self.launch_current(ctx);
        }
    }

    fn take_failures(&mut self) -> Vec<StepFailure> {
        std::mem::take(&mut self.failures)
    }

    fn len(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::testing::LogStep;

    #[test]
    fn empty_sequence_is_immediately_done() {
        let mut log = Vec::new();
        let mut seq: Sequential<LogStep> = Sequential::new(Vec::new());
        assert!(seq.poll(&mut log));
        assert!(log.is_empty());
    }

    #[test]
    fn start_launches_only_first_step() {
        let mut log = Vec::new();
        let mut seq = Sequential::new(vec![LogStep::new("a", 1), LogStep::new("b", 0)]);
        seq.start(&mut log);
        seq.start(&mut log);
        assert_eq!(log, vec!["launch a"]);
    }

    #[test]
    fn next_step_waits_for_current() {
        let mut log = Vec::new();
        let mut seq = Sequential::new(vec![LogStep::new("a", 2), LogStep::new("b", 1)]);

        assert!(!seq.poll(&mut log));
        assert!(!seq.poll(&mut log));
        assert_eq!(log, vec!["launch a"]);

        assert!(!seq.poll(&mut log));
        assert_eq!(log, vec!["launch a", "settle a", "launch b"]);
        assert_eq!(seq.position(), 1);

        assert!(seq.poll(&mut log));
        assert_eq!(log, vec!["launch a", "settle a", "launch b", "settle b"]);
    }

    #[test]
    fn ready_steps_chain_within_one_poll() {
        let mut log = Vec::new();
        let mut seq = Sequential::new(vec![
            LogStep::new("a", 0),
            LogStep::new("b", 0),
            LogStep::new("c", 0),
        ]);
        assert!(seq.poll(&mut log));
        assert_eq!(seq.position(), 3);
    }

    #[test]
    fn failed_step_does_not_stall() {
        let mut log = Vec::new();
        let mut seq = Sequential::new(vec![
            LogStep::failing("a", 0),
            LogStep::panicking("b"),
            LogStep::new("c", 0),
        ]);

        assert!(seq.poll(&mut log));
        let failures = seq.take_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].step, "a");
        assert_eq!(failures[1].step, "b");
        assert!(log.contains(&"settle c".to_string()));
        assert!(seq.take_failures().is_empty());
    }
}
