//! TaskStore port - task handle registry（handle ごとの正本）
//!
//! TaskStore は handle ごとに 1 レコードだけを保持し、更新は置き換えです。
//!
//! # 設計原則
//! - claim（Pending → Running）は原子的。再配送された job が二重に claim しても
//!   Task の不変条件は壊れない
//! - 終端状態（Succeeded / Failed）への遷移は 1 回だけ
//! - 未知の handle は `StoreError::NotFound`。デフォルトのレコードは返さない

use async_trait::async_trait;

use crate::domain::{InvalidTransition, RegistryCounts, TaskId, TaskRecord};
use crate::progress::ProgressUpdate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task already exists: {0}")]
    AlreadyExists(TaskId),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a worker's claim on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Pending → Running; first execution.
    Acquired,
    /// The task was already Running (redelivery); this is a fresh execution.
    Reacquired,
    /// The task already finished; the job must not run again.
    AlreadyTerminal,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Record a new `Pending` task.
    async fn insert(&self, record: TaskRecord) -> Result<(), StoreError>;

    /// Latest snapshot of a task.
    async fn get(&self, task_id: TaskId) -> Result<TaskRecord, StoreError>;

    /// Atomically move a task to `Running`.
    async fn claim(&self, task_id: TaskId) -> Result<Claim, StoreError>;

    /// Mirror a progress update. `Ok(false)` when it was not ahead of the
    /// recorded progress.
    async fn update_progress(
        &self,
        task_id: TaskId,
        update: ProgressUpdate,
    ) -> Result<bool, StoreError>;

    /// Terminal success; sets the result and pins progress to 1.0 together.
    async fn succeed(&self, task_id: TaskId, result: String) -> Result<(), StoreError>;

    /// Terminal failure with an opaque error summary.
    async fn fail(&self, task_id: TaskId, error: String) -> Result<(), StoreError>;

    /// Number of tasks per state.
    async fn counts(&self) -> Result<RegistryCounts, StoreError>;
}
