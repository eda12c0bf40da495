//! Task record: the registry's single record per handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::InvalidTransition;
use super::{Precision, TaskId, TaskState};
use crate::kernel::Checkpoint;

/// State of one submitted task.
///
/// Design:
/// - This is the "single source of truth" for a task; the registry keeps at
///   most one per `TaskId` and replaces it in place.
/// - All state transitions happen through the methods below, so `result`
///   and `error` can only appear together with their terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub precision: Precision,
    pub state: TaskState,

    /// Fraction of samples taken, in `[0.0, 1.0]`.
    pub progress: f64,

    /// Latest kernel counters mirrored from the progress channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Number of times a worker claimed this task (redeliveries included).
    pub claims: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(task_id: TaskId, precision: Precision) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            precision,
            state: TaskState::Pending,
            progress: 0.0,
            checkpoint: None,
            result: None,
            error: None,
            claims: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as running. A redelivered job claims a `Running` task again; the
    /// recorded progress is kept so readers never see it go backwards.
    pub fn claim(&mut self) -> Result<(), InvalidTransition> {
        if !self.state.is_claimable() {
            return Err(self.transition_error(TaskState::Running));
        }
        self.state = TaskState::Running;
        self.claims += 1;
        self.touch();
        Ok(())
    }

    /// Record a progress checkpoint.
    ///
    /// Returns `Ok(false)` when the update is not ahead of what is already
    /// recorded (stale or coalesced) and leaves the record untouched.
    /// Values at or above 1.0 are refused: 1.0 is reserved for success.
    pub fn record_progress(
        &mut self,
        progress: f64,
        checkpoint: Checkpoint,
    ) -> Result<bool, InvalidTransition> {
        if self.state != TaskState::Running {
            return Err(self.transition_error(TaskState::Running));
        }
        if !(progress > self.progress && progress < 1.0) {
            return Ok(false);
        }
        self.progress = progress;
        self.checkpoint = Some(checkpoint);
        self.touch();
        Ok(true)
    }

    /// Mark as succeeded; progress is pinned to 1.0 in the same update.
    pub fn mark_succeeded(&mut self, result: String) -> Result<(), InvalidTransition> {
        if self.state != TaskState::Running {
            return Err(self.transition_error(TaskState::Succeeded));
        }
        self.state = TaskState::Succeeded;
        self.progress = 1.0;
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    pub fn mark_failed(&mut self, error: String) -> Result<(), InvalidTransition> {
        if self.state.is_terminal() {
            return Err(self.transition_error(TaskState::Failed));
        }
        self.state = TaskState::Failed;
        self.error = Some(error);
        self.touch();
        Ok(())
    }

    fn transition_error(&self, to: TaskState) -> InvalidTransition {
        InvalidTransition {
            task_id: self.task_id,
            from: self.state,
            to,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
