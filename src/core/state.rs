//! State hooks and the handle type used to address nodes in a [`StateTree`].
//!
//! A state's behavior is a [`State`] trait object chosen when the tree is
//! built. The tree itself owns the structure (parent links, active-child
//! slots, activities); hooks only see it through a read-only
//! [`StateContext`].
//!
//! [`StateTree`]: super::tree::StateTree

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::tree::Node;

/// Handle to a node in a [`StateTree`](super::tree::StateTree).
///
/// Handles are plain indices into the tree's arena. They are only meaningful
/// for the tree that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-state behavior.
///
/// Every hook has a default, so a purely structural state only needs a name.
/// Hooks run synchronously on the tick thread; long-running work belongs in
/// an [`Activity`](super::activity::Activity).
///
/// # Example
///
/// ```rust
/// use layerstate::core::{State, StateContext, StateId};
///
/// struct Idle {
///     idle_for: f32,
/// }
///
/// impl State for Idle {
///     fn name(&self) -> &str {
///         "Idle"
///     }
///
///     fn on_update(&mut self, _ctx: &StateContext<'_>, dt: f32) {
///         self.idle_for += dt;
///     }
///
///     fn transition(&mut self, ctx: &StateContext<'_>) -> Option<StateId> {
///         if self.idle_for > 5.0 {
///             ctx.lookup("Run")
///         } else {
///             None
///         }
///     }
/// }
/// ```
pub trait State: Send {
    /// Name for display and logging.
    fn name(&self) -> &str;

    /// Called when the state becomes part of the active chain.
    fn on_enter(&mut self, _ctx: &StateContext<'_>) {}

    /// Called after the state's active child (if any) has exited.
    fn on_exit(&mut self, _ctx: &StateContext<'_>) {}

    /// Per-tick update. Runs after the active child has been updated.
    fn on_update(&mut self, _ctx: &StateContext<'_>, _dt: f32) {}

    /// Child to enter automatically after this state is entered.
    ///
    /// Asked for the whole descent before a swap enters anything, so the
    /// context still shows the tree as it was. Returning a state that is not
    /// a direct child aborts the transition with nothing changed. Defaults to
    /// the initial child declared when the tree was built.
    fn initial_child(&mut self, ctx: &StateContext<'_>) -> Option<StateId> {
        ctx.declared_initial()
    }

    /// Self-transition predicate, evaluated before the state updates.
    ///
    /// Returning a target defers the request to the sequencer and skips the
    /// update of this state and its descendants for the current tick.
    fn transition(&mut self, _ctx: &StateContext<'_>) -> Option<StateId> {
        None
    }
}

/// A state with no behavior beyond its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoopState {
    name: String,
}

impl NoopState {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl State for NoopState {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Read-only view of the tree handed to state hooks.
pub struct StateContext<'a> {
    id: StateId,
    nodes: &'a [Node],
    index: &'a HashMap<String, StateId>,
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(id: StateId, nodes: &'a [Node], index: &'a HashMap<String, StateId>) -> Self {
        Self { id, nodes, index }
    }

    /// The state whose hook is running.
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.nodes[self.id.0].name
    }

    pub fn parent(&self) -> Option<StateId> {
        self.nodes[self.id.0].parent
    }

    pub fn children(&self) -> &[StateId] {
        &self.nodes[self.id.0].children
    }

    /// Initial child declared at build time, if any.
    pub fn declared_initial(&self) -> Option<StateId> {
        self.nodes[self.id.0].initial
    }

    pub fn active_child(&self) -> Option<StateId> {
        self.nodes[self.id.0].active_child
    }

    /// Resolve another state of the same tree by name.
    pub fn lookup(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }
}
