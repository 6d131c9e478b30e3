//! The driving shell around the state tree.
//!
//! A host loop calls [`StateMachine::tick`] once per frame. The machine
//! starts lazily on the first tick and from then on delegates everything to
//! its [`TransitionSequencer`]: while a transition phase is in flight the
//! sequencer polls it, otherwise it runs the normal recursive update.
//!
//! # Example
//!
//! ```rust
//! use layerstate::builder::TreeBuilder;
//! use layerstate::core::NoopState;
//! use layerstate::machine::{MachineConfig, StateMachine};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut tree = TreeBuilder::new();
//! let root = tree.root(NoopState::new("Root"));
//! let idle = tree.child(root, NoopState::new("Idle"));
//! let run = tree.child(root, NoopState::new("Run"));
//! tree.initial(root, idle);
//!
//! let mut machine = StateMachine::new(
//!     tree.build().unwrap(),
//!     MachineConfig::default(),
//!     CancellationToken::new(),
//! );
//! machine.tick(0.016).unwrap();
//! assert_eq!(machine.leaf(), idle);
//!
//! machine.request_transition(idle, Some(run)).unwrap();
//! while machine.is_transitioning() {
//!     machine.tick(0.016).unwrap();
//! }
//! assert_eq!(machine.leaf(), run);
//! ```

mod config;
mod sequencer;

pub use config::MachineConfig;
pub use sequencer::{RequestOutcome, SequencerPhase, TransitionSequencer};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{ConfigError, StateId, StateTree, TransitionHistory, TransitionPath};

/// Owns the state tree and the transition sequencer.
pub struct StateMachine {
    tree: StateTree,
    sequencer: TransitionSequencer,
    config: MachineConfig,
    cancel: CancellationToken,
    started: bool,
}

impl StateMachine {
    /// Create a machine over `tree`.
    ///
    /// `cancel` lives as long as the machine; each transition runs its
    /// activities under a child token of it.
    pub fn new(tree: StateTree, config: MachineConfig, cancel: CancellationToken) -> Self {
        let sequencer = TransitionSequencer::new(&config, cancel.clone());
        Self {
            tree,
            sequencer,
            config,
            cancel,
            started: false,
        }
    }

    /// Enter the root (and its initial chain) and activate what was entered.
    ///
    /// Only the first call has an effect.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if self.started {
            return Ok(());
        }
        let root = self.tree.root();
        self.tree.enter(root)?;
        self.started = true;
        info!(
            root = %self.tree.name(root).unwrap_or("?"),
            leaf = %self.tree.name(self.tree.leaf(root)).unwrap_or("?"),
            "state machine started"
        );
        self.sequencer.begin_startup(&mut self.tree)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) -> Result<(), ConfigError> {
        self.start()?;
        self.sequencer.tick(&mut self.tree, dt)
    }

    /// Request a phased transition. Starts the machine if needed.
    pub fn request_transition(
        &mut self,
        from: StateId,
        to: Option<StateId>,
    ) -> Result<RequestOutcome, ConfigError> {
        self.start()?;
        self.sequencer.request_transition(&mut self.tree, from, to)
    }

    /// Immediate structural swap, without running any activities.
    pub fn change_state(&mut self, from: StateId, to: StateId) -> Result<TransitionPath, ConfigError> {
        self.tree.change_state(from, to)
    }

    /// Cancel every outstanding and future activity call.
    pub fn shutdown(&self) {
        debug!("cancelling state machine");
        self.cancel.cancel();
    }

    pub fn is_transitioning(&self) -> bool {
        self.sequencer.is_busy()
    }

    pub fn phase(&self) -> SequencerPhase {
        self.sequencer.phase()
    }

    pub fn root(&self) -> StateId {
        self.tree.root()
    }

    /// Deepest currently active state.
    pub fn leaf(&self) -> StateId {
        self.tree.leaf(self.tree.root())
    }

    /// Active chain, root first.
    pub fn active_path(&self) -> Vec<StateId> {
        self.tree.active_path(self.tree.root())
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn sequencer(&self) -> &TransitionSequencer {
        &self.sequencer
    }

    pub fn history(&self) -> &TransitionHistory {
        self.sequencer.history()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
