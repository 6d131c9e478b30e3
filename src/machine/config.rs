//! Machine configuration.

use serde::{Deserialize, Serialize};

use crate::sequence::SequenceMode;

/// Tunables for a [`StateMachine`](super::StateMachine).
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// can embed this in its own settings and only name what it overrides. The
/// cancellation signal is passed to the machine's constructor instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Scheduling of the steps inside each phase.
    pub sequence_mode: SequenceMode,
    /// Completed transitions to keep in the history. `None` keeps all.
    pub history_limit: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            sequence_mode: SequenceMode::Sequential,
            history_limit: Some(64),
        }
    }
}

impl MachineConfig {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn parallel() -> Self {
        Self {
            sequence_mode: SequenceMode::Parallel,
            ..Self::default()
        }
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}
