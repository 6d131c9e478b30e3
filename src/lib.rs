//! Layerstate: a hierarchical state machine with phased transitions
//!
//! States form a strict tree with exactly one active child per composite
//! state. Entering or leaving a branch can require long-running work (load
//! a bundle, play a fade, wait for a warm-up); that work lives in
//! activities and is driven cooperatively, one poll per host tick, so a
//! transition never blocks the frame.
//!
//! # Core Concepts
//!
//! - **State**: per-node hooks via the `State` trait, addressed by `StateId`
//! - **Activity**: asynchronous enter/exit work with a four-mode lifecycle
//! - **StateTree**: arena of states with LCA and exit/enter chain computation
//! - **TransitionSequencer**: exit phase, structural swap, enter phase
//! - **Sequence**: `Sequential` or `Parallel` runner for a phase's steps
//!
//! # Example
//!
//! ```rust
//! use layerstate::builder::{StateMachineBuilder, TreeBuilder};
//! use layerstate::core::{activity, ActivityMode, NoopState};
//!
//! let mut tree = TreeBuilder::new();
//! let root = tree.root(NoopState::new("Root"));
//! let menu = tree.child(root, NoopState::new("Menu"));
//! let level = tree.child(root, NoopState::new("Level"));
//! tree.initial(root, menu);
//! tree.activity(
//!     level,
//!     activity::from_fn(
//!         "load-level",
//!         |_cancel| activity::yield_for(3),
//!         |_cancel| activity::yield_for(1),
//!     ),
//! );
//!
//! let mut machine = StateMachineBuilder::new().tree(tree).build().unwrap();
//! machine.request_transition(menu, Some(level)).unwrap();
//! while machine.is_transitioning() {
//!     machine.tick(1.0 / 60.0).unwrap();
//! }
//!
//! assert_eq!(machine.leaf(), level);
//! assert_eq!(machine.tree().activity_mode(level, 0), Some(ActivityMode::Active));
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod sequence;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder, TreeBuilder};
pub use core::{Activity, ActivityError, ActivityMode, ConfigError, State, StateId, StateTree};
pub use machine::{MachineConfig, RequestOutcome, SequencerPhase, StateMachine};
pub use sequence::SequenceMode;
