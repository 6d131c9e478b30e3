//! Builder for constructing state machines.

use tokio_util::sync::CancellationToken;

use crate::builder::error::BuildError;
use crate::builder::tree::TreeBuilder;
use crate::machine::{MachineConfig, StateMachine};
use crate::sequence::SequenceMode;

/// Builder for constructing state machines with a fluent API.
#[derive(Default)]
pub struct StateMachineBuilder {
    tree: Option<TreeBuilder>,
    config: MachineConfig,
    cancel: Option<CancellationToken>,
}

impl StateMachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state tree (required).
    pub fn tree(mut self, tree: TreeBuilder) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sequence_mode(mut self, mode: SequenceMode) -> Self {
        self.config.sequence_mode = mode;
        self
    }

    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Machine-lifetime cancellation signal. A fresh token is used if unset.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the state machine.
    /// Returns an error if the tree is missing or invalid.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let tree = self.tree.ok_or(BuildError::MissingTree)?.build()?;
        let cancel = self.cancel.unwrap_or_else(CancellationToken::new);
        Ok(StateMachine::new(tree, self.config, cancel))
    }
}
