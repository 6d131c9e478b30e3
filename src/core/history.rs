//! Transition history tracking.
//!
//! Every transition that runs both phases to completion is recorded with its
//! timestamps and the number of activity steps that failed along the way.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Record of one completed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Identifier shared by every log event of the transition
    pub id: Uuid,
    /// The state that requested (or was named as the source of) the transition
    pub from: StateId,
    /// The transition target
    pub to: StateId,
    /// Least common ancestor of `from` and `to`
    pub lca: StateId,
    pub from_name: String,
    pub to_name: String,
    /// When the exit phase started
    pub started_at: DateTime<Utc>,
    /// When the enter phase completed
    pub finished_at: DateTime<Utc>,
    /// Activity steps that terminated abnormally in either phase
    pub failed_steps: usize,
}

impl TransitionRecord {
    /// Wall-clock time spent across both phases.
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps == 0
    }
}

/// Ordered history of completed transitions.
///
/// History is immutable - `record` returns a new history with the
/// transition appended.
///
/// # Example
///
/// ```rust
/// use layerstate::core::TransitionHistory;
///
/// let history = TransitionHistory::new();
/// assert!(history.transitions().is_empty());
/// assert!(history.duration().is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionHistory {
    transitions: Vec<TransitionRecord>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: TransitionRecord) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Record a transition and keep at most `limit` of the newest entries.
    pub fn record_bounded(&self, transition: TransitionRecord, limit: Option<usize>) -> Self {
        let mut next = self.record(transition);
        if let Some(limit) = limit {
            let excess = next.transitions.len().saturating_sub(limit);
            next.transitions.drain(..excess);
        }
        next
    }

    /// Names of the states visited: the first source, then every target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(first.from_name.as_str());
        }
        for transition in &self.transitions {
            path.push(transition.to_name.as_str());
        }
        path
    }

    /// Time from the first transition's start to the last one's finish.
    ///
    /// Returns `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.finished_at.signed_duration_since(first.started_at);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.last()
    }

    /// Total failed activity steps across every recorded transition.
    pub fn failed_steps(&self) -> usize {
        self.transitions.iter().map(|t| t.failed_steps).sum()
    }
}
