//! Activities: asynchronous enter/exit work bound to a state.
//!
//! An activity is the extension point for collaborators (load a bundle,
//! play a fade, wait for a warm-up). It only produces futures; the
//! [`ActivitySlot`] that wraps it owns the lifecycle mode and guards every
//! call so that mismatched requests resolve immediately as no-ops.

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::task::Poll;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Work produced by an activity call. Polled cooperatively, never blocked on.
pub type ActivityFuture = BoxFuture<'static, Result<(), ActivityError>>;

/// Lifecycle of an activity.
///
/// Modes only advance through the cycle
/// `Inactive -> Activating -> Active -> Deactivating -> Inactive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityMode {
    Inactive,
    Activating,
    Active,
    Deactivating,
}

impl ActivityMode {
    /// True while an activate or deactivate call is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Activating | Self::Deactivating)
    }
}

/// Which half of the lifecycle a step drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Activate,
    Deactivate,
}

/// Abnormal termination of an activity's work.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity failed: {0}")]
    Failed(String),

    #[error("activity cancelled")]
    Cancelled,

    #[error("activity panicked: {0}")]
    Panicked(String),
}

/// Asynchronous enter/exit work attached to a state.
///
/// Implementations return `'static` futures; anything the work needs must be
/// moved or cloned into the future. The cancellation token is the one for the
/// transition that issued the call.
pub trait Activity: Send {
    fn name(&self) -> &str {
        "activity"
    }

    fn activate(&mut self, cancel: CancellationToken) -> ActivityFuture;

    fn deactivate(&mut self, cancel: CancellationToken) -> ActivityFuture;
}

/// Owner of an activity's mode.
///
/// The slot is the single writer of [`ActivityMode`]: it moves to the
/// in-progress mode when work is launched and to the resting mode when the
/// work settles.
pub struct ActivitySlot {
    activity: Box<dyn Activity>,
    mode: ActivityMode,
}

impl ActivitySlot {
    pub fn new(activity: Box<dyn Activity>) -> Self {
        Self {
            activity,
            mode: ActivityMode::Inactive,
        }
    }

    pub fn mode(&self) -> ActivityMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        self.activity.name()
    }

    /// Launch work in `direction`.
    ///
    /// Outside the valid source mode this returns an already-completed future
    /// and leaves the mode untouched.
    pub(crate) fn begin(&mut self, direction: Direction, cancel: CancellationToken) -> ActivityFuture {
        match (direction, self.mode) {
            (Direction::Activate, ActivityMode::Inactive) => {
                self.mode = ActivityMode::Activating;
                self.activity.activate(cancel)
            }
            (Direction::Deactivate, ActivityMode::Active) => {
                self.mode = ActivityMode::Deactivating;
                self.activity.deactivate(cancel)
            }
            _ => future::ready(Ok(())).boxed(),
        }
    }

    /// Move an in-progress mode to its resting mode.
    ///
    /// Called once the launched work has completed, failed or not.
    pub(crate) fn settle(&mut self) {
        self.mode = match self.mode {
            ActivityMode::Activating => ActivityMode::Active,
            ActivityMode::Deactivating => ActivityMode::Inactive,
            resting => resting,
        };
    }
}

/// Work that stays pending for `polls` polls, then completes.
///
/// Useful for frame-count delays and for tests.
pub fn yield_for(polls: usize) -> ActivityFuture {
    let mut remaining = polls;
    future::poll_fn(move |cx| {
        if remaining == 0 {
            Poll::Ready(Ok(()))
        } else {
            remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .boxed()
}

/// Activity built from two closures.
pub struct FnActivity<A, D> {
    name: String,
    on_activate: A,
    on_deactivate: D,
}

/// Build an activity from an activate and a deactivate closure.
///
/// # Example
///
/// ```rust
/// use futures::future::{self, FutureExt};
/// use layerstate::core::activity::from_fn;
///
/// let fade = from_fn(
///     "fade",
///     |_cancel| future::ready(Ok(())).boxed(),
///     |_cancel| future::ready(Ok(())).boxed(),
/// );
/// ```
pub fn from_fn<A, D>(name: impl Into<String>, on_activate: A, on_deactivate: D) -> FnActivity<A, D>
where
    A: FnMut(CancellationToken) -> ActivityFuture + Send,
    D: FnMut(CancellationToken) -> ActivityFuture + Send,
{
    FnActivity {
        name: name.into(),
        on_activate,
        on_deactivate,
    }
}

impl<A, D> Activity for FnActivity<A, D>
where
    A: FnMut(CancellationToken) -> ActivityFuture + Send,
    D: FnMut(CancellationToken) -> ActivityFuture + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&mut self, cancel: CancellationToken) -> ActivityFuture {
        (self.on_activate)(cancel)
    }

    fn deactivate(&mut self, cancel: CancellationToken) -> ActivityFuture {
        (self.on_deactivate)(cancel)
    }
}
