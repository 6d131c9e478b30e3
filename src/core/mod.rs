//! Core hierarchical state machine types.
//!
//! This module contains the structural half of the machine:
//! - States and their hooks via the `State` trait
//! - Activities, the asynchronous work bound to a state
//! - The arena-backed `StateTree` with LCA and chain computation
//! - Immutable transition history
//!
//! Nothing in here suspends or polls; driving activities across ticks is the
//! job of [`crate::machine`].

pub mod activity;
mod error;
mod history;
mod state;
mod tree;

pub use activity::{Activity, ActivityError, ActivityFuture, ActivityMode, ActivitySlot, Direction};
pub use error::ConfigError;
pub use history::{TransitionHistory, TransitionRecord};
pub use state::{NoopState, State, StateContext, StateId};
pub use tree::{PathToRoot, StateTree, TransitionPath};

pub(crate) use tree::Node;

#[cfg(test)]
pub(crate) use tree::tests as fixtures;
