//! Builder API for state trees and machines.
//!
//! Trees are assembled once, validated as a whole, and never change shape
//! afterwards. [`TreeBuilder`] hands out [`StateId`](crate::core::StateId)
//! handles as states are added; [`StateMachineBuilder`] wraps a finished
//! tree with configuration and a cancellation signal.

pub mod error;
pub mod machine;
pub mod tree;

pub use error::{BuildError, TreeViolation};
pub use machine::StateMachineBuilder;
pub use tree::TreeBuilder;
