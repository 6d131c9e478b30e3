//! Phased transition orchestration.
//!
//! A transition runs in two phases: the old branch's activities are
//! deactivated, the tree is structurally swapped, then the new branch's
//! activities are activated. Each phase is a [`Sequence`] polled once per
//! tick. While either phase is in flight the normal per-state update is
//! suppressed and at most one further request is buffered.

use chrono::{DateTime, Utc};
use futures::future::{self, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::{
    ActivityError, ActivityFuture, ConfigError, Direction, StateId, StateTree, TransitionHistory,
    TransitionPath, TransitionRecord,
};
use crate::sequence::{PhaseStep, Sequence, SequenceMode, StepResult};

use super::config::MachineConfig;

/// Which part of a transition the sequencer is executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequencerPhase {
    /// No sequence running; states update normally.
    Idle,
    /// Deactivating the branch being left.
    Exiting,
    /// Activating the branch just entered.
    Entering,
}

/// What happened to a transition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Degenerate request (`to` missing or equal to `from`).
    Ignored,
    /// Buffered until the in-flight transition finishes. `replaced` is the
    /// earlier pending request this one superseded.
    Deferred {
        replaced: Option<(StateId, StateId)>,
    },
    /// The exit phase has begun.
    Started,
}

/// Drives one activity of one state in one direction.
pub(crate) struct ActivityStep {
    state: StateId,
    index: usize,
    direction: Direction,
    cancel: CancellationToken,
    label: String,
}

impl ActivityStep {
    /// Fails with `DetachedActivity` when `state` has no activity `index`.
    fn new(
        tree: &StateTree,
        state: StateId,
        index: usize,
        direction: Direction,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        let activity = tree
            .activity_name(state, index)
            .ok_or(ConfigError::DetachedActivity { state, index })?;
        let label = format!(
            "{:?} {}/{}",
            direction,
            tree.name(state).unwrap_or("?"),
            activity,
        );
        Ok(Self {
            state,
            index,
            direction,
            cancel,
            label,
        })
    }
}

impl PhaseStep<StateTree> for ActivityStep {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn launch(&mut self, tree: &mut StateTree) -> ActivityFuture {
        // Slots are never removed, so the one resolved in `new` is still here.
        match tree.slot_mut(self.state, self.index) {
            Ok(slot) => slot.begin(self.direction, self.cancel.clone()),
            Err(err) => {
                error!(step = %self.label, error = %err, "step has no activity");
                future::ready(Err(ActivityError::Failed(err.to_string()))).boxed()
            }
        }
    }

    fn settle(&mut self, tree: &mut StateTree, _result: &StepResult) {
        if let Ok(slot) = tree.slot_mut(self.state, self.index) {
            slot.settle();
        }
    }
}

fn activity_steps(
    tree: &StateTree,
    states: &[StateId],
    direction: Direction,
    cancel: &CancellationToken,
) -> Result<Vec<ActivityStep>, ConfigError> {
    states
        .iter()
        .flat_map(|&state| {
            (0..tree.activity_count(state))
                .map(move |index| ActivityStep::new(tree, state, index, direction, cancel.clone()))
        })
        .collect()
}

fn name_of(tree: &StateTree, id: StateId) -> String {
    tree.name(id).unwrap_or("?").to_string()
}

/// Bookkeeping for the transition currently being executed.
struct InFlight {
    id: Uuid,
    /// `None` for the activation pass that follows machine start.
    path: Option<TransitionPath>,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    failed_steps: usize,
}

/// Orchestrates exit phase, structural swap and enter phase.
pub struct TransitionSequencer {
    mode: SequenceMode,
    history_limit: Option<usize>,
    cancel: CancellationToken,
    current_sequence: Option<Box<dyn Sequence<StateTree>>>,
    /// Swap still to perform once the exit phase completes.
    next_phase: Option<TransitionPath>,
    in_flight: Option<InFlight>,
    pending: Option<(StateId, StateId)>,
    history: TransitionHistory,
}

impl TransitionSequencer {
    /// Every transition's token is a child of `cancel`.
    pub fn new(config: &MachineConfig, cancel: CancellationToken) -> Self {
        Self {
            mode: config.sequence_mode,
            history_limit: config.history_limit,
            cancel,
            current_sequence: None,
            next_phase: None,
            in_flight: None,
            pending: None,
            history: TransitionHistory::new(),
        }
    }

    pub fn phase(&self) -> SequencerPhase {
        match (&self.current_sequence, &self.next_phase) {
            (None, _) => SequencerPhase::Idle,
            (Some(_), Some(_)) => SequencerPhase::Exiting,
            (Some(_), None) => SequencerPhase::Entering,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current_sequence.is_some()
    }

    /// The buffered request, if any.
    pub fn pending(&self) -> Option<(StateId, StateId)> {
        self.pending
    }

    /// Token handed to the in-flight transition's activities.
    ///
    /// Cancelling it aborts only that transition's outstanding work.
    pub fn current_cancellation(&self) -> Option<&CancellationToken> {
        self.in_flight.as_ref().map(|flight| &flight.cancel)
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// Ask for a transition from `from` to `to`.
    ///
    /// Starts it immediately when idle. While busy the request replaces any
    /// earlier pending one and runs after the in-flight transition.
    pub fn request_transition(
        &mut self,
        tree: &mut StateTree,
        from: StateId,
        to: Option<StateId>,
    ) -> Result<RequestOutcome, ConfigError> {
        let Some(to) = to else {
            return Ok(RequestOutcome::Ignored);
        };
        if to == from {
            debug!(state = %name_of(tree, from), "ignoring self transition request");
            return Ok(RequestOutcome::Ignored);
        }
        for id in [from, to] {
            if !tree.contains(id) {
                error!(state = %id, "transition request names a state outside the tree");
                return Err(ConfigError::UnknownState(id));
            }
        }

        if self.is_busy() {
            let replaced = self.pending.replace((from, to));
            if let Some((old_from, old_to)) = replaced {
                warn!(
                    from = %name_of(tree, old_from),
                    to = %name_of(tree, old_to),
                    "pending transition superseded"
                );
            }
            debug!(
                from = %name_of(tree, from),
                to = %name_of(tree, to),
                "transition deferred"
            );
            return Ok(RequestOutcome::Deferred { replaced });
        }

        self.begin_transition(tree, from, to)?;
        Ok(RequestOutcome::Started)
    }

    /// Compute the chains and start the exit phase.
    fn begin_transition(
        &mut self,
        tree: &mut StateTree,
        from: StateId,
        to: StateId,
    ) -> Result<(), ConfigError> {
        let path = tree.prepare(from, to).map_err(|err| {
            error!(error = %err, "transition aborted before it started");
            err
        })?;

        // Everything still entered below the pivot, then any part of the exit
        // chain that is not (those resolve as no-op steps).
        let mut leaving = tree.active_below(path.pivot);
        leaving.reverse();
        for state in &path.exit {
            if !leaving.contains(state) {
                leaving.push(*state);
            }
        }

        let id = Uuid::new_v4();
        let cancel = self.cancel.child_token();
        let steps = activity_steps(tree, &leaving, Direction::Deactivate, &cancel)?;
        debug!(
            transition_id = %id,
            from = %name_of(tree, from),
            to = %name_of(tree, to),
            lca = %name_of(tree, path.lca),
            steps = steps.len(),
            "exit phase started"
        );

        let mut sequence = self.mode.build(steps);
        sequence.start(tree);
        self.current_sequence = Some(sequence);
        self.next_phase = Some(path);
        self.in_flight = Some(InFlight {
            id,
            path: None,
            started_at: Utc::now(),
            cancel,
            failed_steps: 0,
        });
        Ok(())
    }

    /// Activate everything on the freshly entered chain after machine start.
    pub(crate) fn begin_startup(&mut self, tree: &mut StateTree) -> Result<(), ConfigError> {
        let entered = tree.active_path(tree.root());
        let cancel = self.cancel.child_token();
        let steps = activity_steps(tree, &entered, Direction::Activate, &cancel)?;
        if steps.is_empty() {
            return Ok(());
        }

        debug!(steps = steps.len(), "startup activation started");
        let mut sequence = self.mode.build(steps);
        sequence.start(tree);
        self.current_sequence = Some(sequence);
        self.in_flight = Some(InFlight {
            id: Uuid::new_v4(),
            path: None,
            started_at: Utc::now(),
            cancel,
            failed_steps: 0,
        });
        Ok(())
    }

    /// Advance the in-flight phase, or run the normal update when idle.
    pub fn tick(&mut self, tree: &mut StateTree, dt: f32) -> Result<(), ConfigError> {
        if self.current_sequence.is_none() {
            if let Some((from, to)) = self.pending.take() {
                return self.begin_transition(tree, from, to);
            }
            if let Some((from, to)) = tree.update(tree.root(), dt) {
                self.request_transition(tree, from, Some(to))?;
            }
            return Ok(());
        }

        let Some(sequence) = self.current_sequence.as_mut() else {
            return Ok(());
        };
        if !sequence.poll(tree) {
            return Ok(());
        }

        let failed = sequence.take_failures().len();
        if let Some(flight) = self.in_flight.as_mut() {
            flight.failed_steps += failed;
        }

        match self.next_phase.take() {
            Some(path) => self.begin_enter_phase(tree, path),
            None => self.end_transition(tree),
        }
    }

    /// Structural swap followed by the activate phase.
    fn begin_enter_phase(
        &mut self,
        tree: &mut StateTree,
        path: TransitionPath,
    ) -> Result<(), ConfigError> {
        tree.apply(&path);

        let Some(flight) = self.in_flight.as_mut() else {
            return Ok(());
        };
        let entering = tree.active_below(path.pivot);
        let steps = match activity_steps(tree, &entering, Direction::Activate, &flight.cancel) {
            Ok(steps) => steps,
            Err(err) => return Err(self.abort(err)),
        };
        debug!(
            transition_id = %flight.id,
            to = %name_of(tree, path.to),
            steps = steps.len(),
            "enter phase started"
        );

        let mut sequence = self.mode.build(steps);
        sequence.start(tree);
        self.current_sequence = Some(sequence);
        flight.path = Some(path);
        Ok(())
    }

    /// Record the finished transition and chain into the pending one.
    fn end_transition(&mut self, tree: &mut StateTree) -> Result<(), ConfigError> {
        self.current_sequence = None;

        if let Some(flight) = self.in_flight.take() {
            match flight.path {
                Some(path) => {
                    let record = TransitionRecord {
                        id: flight.id,
                        from: path.from,
                        to: path.to,
                        lca: path.lca,
                        from_name: name_of(tree, path.from),
                        to_name: name_of(tree, path.to),
                        started_at: flight.started_at,
                        finished_at: Utc::now(),
                        failed_steps: flight.failed_steps,
                    };
                    info!(
                        transition_id = %record.id,
                        from = %record.from_name,
                        to = %record.to_name,
                        failed_steps = record.failed_steps,
                        "transition complete"
                    );
                    self.history = self.history.record_bounded(record, self.history_limit);
                }
                None => debug!(failed_steps = flight.failed_steps, "startup activation complete"),
            }
        }

        if let Some((from, to)) = self.pending.take() {
            debug!(
                from = %name_of(tree, from),
                to = %name_of(tree, to),
                "starting pending transition"
            );
            return self.begin_transition(tree, from, to);
        }
        Ok(())
    }

    fn abort(&mut self, err: ConfigError) -> ConfigError {
        self.current_sequence = None;
        self.next_phase = None;
        if let Some(flight) = self.in_flight.take() {
            flight.cancel.cancel();
            error!(transition_id = %flight.id, error = %err, "transition aborted");
        }
        err
    }
}
