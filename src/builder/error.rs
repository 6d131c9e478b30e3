//! Build errors for state trees and machines.

use crate::core::StateId;
use thiserror::Error;

/// A single structural problem found while validating a tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeViolation {
    #[error("no root state. Call .root(state) before .build()")]
    MissingRoot,

    #[error("more than one root: '{first}' and '{second}'")]
    MultipleRoots { first: String, second: String },

    #[error("state '{child}' names parent {parent}, which was not added before it")]
    UnknownParent { child: String, parent: StateId },

    #[error("state name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("declared initial child {child} is not a direct child of {parent}")]
    InitialNotChild { parent: StateId, child: StateId },

    #[error("activity attached to unknown state {0}")]
    UnknownActivityOwner(StateId),
}

/// Errors that can occur when building trees and machines.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid state tree ({} problem(s)): {}", .0.len(), join(.0))]
    Invalid(Vec<TreeViolation>),

    #[error("state tree not specified. Call .tree(builder) before .build()")]
    MissingTree,
}

fn join(violations: &[TreeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BuildError {
    /// Every violation found, empty for non-validation errors.
    pub fn violations(&self) -> &[TreeViolation] {
        match self {
            Self::Invalid(violations) => violations,
            Self::MissingTree => &[],
        }
    }
}
