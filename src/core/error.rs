//! Configuration errors raised by the state tree and the transition sequencer.

use super::state::StateId;
use thiserror::Error;

/// Fatal configuration problems.
///
/// These abort the transition attempt that detected them and leave the tree
/// in its last valid structural state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("state {0} is not part of this tree")]
    UnknownState(StateId),

    #[error("states {a} and {b} share no common ancestor")]
    NoCommonAncestor { a: StateId, b: StateId },

    #[error("state {state} is not a descendant of {ancestor}")]
    NotADescendant { ancestor: StateId, state: StateId },

    #[error("activity {index} of state {state} does not exist")]
    DetachedActivity { state: StateId, index: usize },
}
