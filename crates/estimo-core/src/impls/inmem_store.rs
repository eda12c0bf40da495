//! InMemoryTaskStore - プロセス内の task handle registry
//!
//! 1 つの Mutex で HashMap<TaskId, TaskRecord> を守ります。
//! 各操作はロック内で完結するので、claim などの遷移は原子的です。

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RegistryCounts, TaskId, TaskRecord, TaskState};
use crate::ports::{Claim, StoreError, TaskStore};
use crate::progress::ProgressUpdate;

#[derive(Default)]
pub struct InMemoryTaskStore {
    records: Mutex<HashMap<TaskId, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_record<T>(
        &self,
        task_id: TaskId,
        f: impl FnOnce(&mut TaskRecord) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&task_id)
            .ok_or(StoreError::NotFound(task_id))?;
        f(record)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, record: TaskRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        match records.entry(record.task_id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(record.task_id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, task_id: TaskId) -> Result<TaskRecord, StoreError> {
        let records = self.records.lock().await;
        records
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::NotFound(task_id))
    }

    async fn claim(&self, task_id: TaskId) -> Result<Claim, StoreError> {
        self.with_record(task_id, |record| {
            let claim = match record.state {
                TaskState::Pending => Claim::Acquired,
                TaskState::Running => Claim::Reacquired,
                TaskState::Succeeded | TaskState::Failed => return Ok(Claim::AlreadyTerminal),
            };
            record.claim()?;
            Ok(claim)
        })
        .await
    }

    async fn update_progress(
        &self,
        task_id: TaskId,
        update: ProgressUpdate,
    ) -> Result<bool, StoreError> {
        self.with_record(task_id, |record| {
            Ok(record.record_progress(update.fraction, update.checkpoint)?)
        })
        .await
    }

    async fn succeed(&self, task_id: TaskId, result: String) -> Result<(), StoreError> {
        self.with_record(task_id, |record| Ok(record.mark_succeeded(result)?))
            .await
    }

    async fn fail(&self, task_id: TaskId, error: String) -> Result<(), StoreError> {
        self.with_record(task_id, |record| Ok(record.mark_failed(error)?))
            .await
    }

    async fn counts(&self) -> Result<RegistryCounts, StoreError> {
        let records = self.records.lock().await;
        Ok(RegistryCounts::from_states(
            records.values().map(|record| record.state),
        ))
    }
}
