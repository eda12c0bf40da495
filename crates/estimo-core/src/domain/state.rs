//! Task state machine for the registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task state.
///
/// State transitions:
/// - Pending -> Running -> Succeeded
/// - Pending -> Running -> Failed
/// - Running -> Running (redelivered job claimed again)
///
/// Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Recorded at submission, not claimed by any worker yet.
    Pending,

    /// Claimed by a worker; progress updates are accepted.
    Running,

    /// Finished with a result. Progress is pinned at 1.0.
    Succeeded,

    /// Finished with an error summary.
    Failed,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Can a worker claim a task in this state?
    pub fn is_claimable(self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}
