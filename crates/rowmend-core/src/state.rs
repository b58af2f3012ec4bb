//! Run state machine
//!
//! ```text
//! Start -> Loaded -> Consistent -> Enhanced -> Done
//!                 -> Regressed  -> Reapplied -> Enhanced -> Done
//!                 -> Bootstrap  -> Enhanced -> Done
//!                 -> Diverged   -> Failed
//!                 -> NoSnapshot -> Failed
//! ```
//!
//! Every non-terminal state may also fail. `Done` and `Failed` are terminal.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    Loaded,
    Consistent,
    Regressed,
    Bootstrap,
    Reapplied,
    Enhanced,
    Diverged,
    NoSnapshot,
    Done,
    Failed,
}

impl RunState {
    /// No transitions leave this state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Loaded => "loaded",
            Self::Consistent => "consistent",
            Self::Regressed => "regressed",
            Self::Bootstrap => "bootstrap",
            Self::Reapplied => "reapplied",
            Self::Enhanced => "enhanced",
            Self::Diverged => "diverged",
            Self::NoSnapshot => "no_snapshot",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Illegal state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal run state transition: {from} -> {to}")]
pub struct StateError {
    pub from: RunState,
    pub to: RunState,
}

/// Validates a state transition.
///
/// # Errors
/// [`StateError`] if `to` is not reachable from `from` in one step.
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: RunState) -> Vec<RunState> {
    use RunState::*;
    match from {
        Start => vec![Loaded, Failed],
        Loaded => vec![Consistent, Regressed, Bootstrap, Diverged, NoSnapshot, Failed],
        Consistent | Bootstrap | Reapplied => vec![Enhanced, Failed],
        Regressed => vec![Reapplied, Failed],
        Enhanced => vec![Done, Failed],
        Diverged | NoSnapshot => vec![Failed],
        Done | Failed => vec![],
    }
}

/// Current state plus the path that led to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTracker {
    path: Vec<RunState>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    /// Tracker in [`RunState::Start`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: vec![RunState::Start],
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RunState {
        self.path.last().copied().unwrap_or(RunState::Start)
    }

    /// Every state visited, in order
    #[must_use]
    pub fn path(&self) -> &[RunState] {
        &self.path
    }

    /// Move to `to`
    ///
    /// # Errors
    /// [`StateError`] for an illegal transition; the state is unchanged.
    pub fn advance(&mut self, to: RunState) -> Result<(), StateError> {
        let from = self.state();
        validate_transition(from, to)?;
        tracing::debug!(%from, %to, "run state");
        self.path.push(to);
        Ok(())
    }

    /// Move to [`RunState::Failed`] unless already terminal
    pub fn fail(&mut self) {
        if !self.state().is_terminal() {
            self.path.push(RunState::Failed);
        }
    }
}
