//! Protocol - submit / poll の request/response 契約
//!
//! gateway（HTTP など）はこの層だけを呼びます。
//! - submit は task を登録して job を積み、すぐに handle を返す
//! - poll は registry の最新 snapshot をそのまま返す（完了を待たない）

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::{ErrorKind, RegistryCounts, EstimatorJob, Precision, TaskId, TaskRecord, TaskState};
use crate::ports::{DeliveryQueue, IdGenerator, StoreError, TaskStore};

const MISSING_PRECISION: &str = "Parameter n (number of decimals) is required";
const PRECISION_OUT_OF_RANGE: &str = "n must be between 1 and 200";
const MISSING_TASK_ID: &str = "Parameter task_id is required";
const INVALID_TASK_ID: &str = "Invalid task id parameter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// Externally visible task state. `Pending` and `Running` both read as
/// `PROGRESS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollState {
    Progress,
    Finished,
    Failed,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Progress)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub state: PollState,
    /// Fraction complete rendered as a decimal string, e.g. `"0.4213"`.
    pub progress: String,
    pub result: Option<String>,
}

impl PollResponse {
    fn from_record(record: &TaskRecord) -> Self {
        let (state, progress, result) = match record.state {
            TaskState::Pending => (PollState::Progress, 0.0, None),
            TaskState::Running => (PollState::Progress, record.progress, None),
            TaskState::Succeeded => (PollState::Finished, 1.0, record.result.clone()),
            TaskState::Failed => (PollState::Failed, 0.0, None),
        };
        Self {
            state,
            progress: format!("{progress:?}"),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub message: String,
}

/// Error body returned to the gateway: `{ "message": ..., "errors": {} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub errors: serde_json::Value,
}

/// Synchronous protocol errors. Computation failures never show up here;
/// they are observed through `poll`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidParameter(String),

    /// 詳細はログにだけ出す
    #[error("Request could not be processed, internal server error encountered")]
    InternalFault,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            ApiError::InternalFault => ErrorKind::InternalFault,
        }
    }

    /// HTTP status a gateway should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidParameter(_) => 400,
            ApiError::InternalFault => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
            errors: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    fn invalid(message: &str) -> Self {
        ApiError::InvalidParameter(message.to_string())
    }
}

fn internal(context: &'static str, err: impl std::fmt::Display) -> ApiError {
    error!(error = %err, "{context}");
    ApiError::InternalFault
}

/// Submission/polling surface over a registry and a broker.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    queue: Arc<dyn DeliveryQueue>,
    ids: Arc<dyn IdGenerator>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        queue: Arc<dyn DeliveryQueue>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { store, queue, ids }
    }

    /// Register a `Pending` task for `n` decimals and enqueue it.
    pub async fn submit(&self, n: Option<i64>) -> Result<SubmitResponse, ApiError> {
        let n = n.ok_or_else(|| ApiError::invalid(MISSING_PRECISION))?;
        let precision = Precision::new(n).map_err(|_| ApiError::invalid(PRECISION_OUT_OF_RANGE))?;

        let task_id = self.ids.generate_task_id();
        self.store
            .insert(TaskRecord::new(task_id, precision))
            .await
            .map_err(|e| internal("failed to register task", e))?;

        if let Err(e) = self.queue.push(EstimatorJob::new(task_id, precision).into()).await {
            // 配送されない task を Pending のまま残さない
            if let Err(fail_err) = self.store.fail(task_id, e.to_string()).await {
                error!(%task_id, error = %fail_err, "failed to mark undeliverable task");
            }
            return Err(internal("failed to enqueue task", e));
        }

        info!(%task_id, %precision, "task submitted");
        Ok(SubmitResponse {
            task_id: task_id.to_string(),
        })
    }

    /// Latest snapshot for a handle returned by [`submit`](Self::submit).
    pub async fn poll(&self, task_id: Option<&str>) -> Result<PollResponse, ApiError> {
        let raw = task_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::invalid(MISSING_TASK_ID))?;
        let task_id: TaskId = raw.parse().map_err(|_| ApiError::invalid(INVALID_TASK_ID))?;

        match self.store.get(task_id).await {
            Ok(record) => Ok(PollResponse::from_record(&record)),
            Err(StoreError::NotFound(_)) => Err(ApiError::invalid(INVALID_TASK_ID)),
            Err(e) => Err(internal("failed to read task", e)),
        }
    }

    pub async fn counts(&self) -> Result<RegistryCounts, ApiError> {
        self.store
            .counts()
            .await
            .map_err(|e| internal("failed to count tasks", e))
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            service: "π Calculator API".to_string(),
            message: "Ready to calculate π using Monte Carlo magic!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryId, Job};
    use crate::impls::{InMemoryDeliveryQueue, InMemoryTaskStore};
    use crate::kernel::Checkpoint;
    use crate::ports::{JobLease, QueueError, SystemClock, UlidGenerator};
    use crate::progress::ProgressUpdate;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::time::Duration;
    use ulid::Ulid;

    struct Fixture {
        service: TaskService,
        store: Arc<InMemoryTaskStore>,
        queue: Arc<InMemoryDeliveryQueue>,
    }

    fn fixture() -> Fixture {
        let ids: Arc<dyn IdGenerator> = Arc::new(UlidGenerator::new(SystemClock));
        let store = Arc::new(InMemoryTaskStore::new());
        let queue = Arc::new(InMemoryDeliveryQueue::new(Arc::clone(&ids)));
        Fixture {
            service: TaskService::new(store.clone(), queue.clone(), ids),
            store,
            queue,
        }
    }

    fn task_id(response: &SubmitResponse) -> TaskId {
        response.task_id.parse().unwrap()
    }

    #[rstest]
    #[case(1)]
    #[case(200)]
    #[tokio::test]
    async fn submit_accepts_bounds(#[case] n: i64) {
        let f = fixture();
        let response = f.service.submit(Some(n)).await.unwrap();

        let record = f.store.get(task_id(&response)).await.unwrap();
        assert_eq!(record.state, TaskState::Pending);
        assert_eq!(record.precision.digits() as i64, n);
        assert_eq!(f.queue.ready_len(), 1);
    }

    #[rstest]
    #[case(Some(0), PRECISION_OUT_OF_RANGE)]
    #[case(Some(201), PRECISION_OUT_OF_RANGE)]
    #[case(Some(-5), PRECISION_OUT_OF_RANGE)]
    #[case(None, MISSING_PRECISION)]
    #[tokio::test]
    async fn submit_rejects_invalid_precision(#[case] n: Option<i64>, #[case] message: &str) {
        let f = fixture();
        let err = f.service.submit(n).await.unwrap_err();

        assert_eq!(err, ApiError::InvalidParameter(message.to_string()));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(f.queue.ready_len(), 0);
        assert_eq!(f.store.counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn handles_are_distinct() {
        let f = fixture();
        let a = f.service.submit(Some(3)).await.unwrap();
        let b = f.service.submit(Some(3)).await.unwrap();
        assert_ne!(a.task_id, b.task_id);
    }

    #[rstest]
    #[case(None, MISSING_TASK_ID)]
    #[case(Some(""), MISSING_TASK_ID)]
    #[case(Some("not-a-handle"), INVALID_TASK_ID)]
    #[tokio::test]
    async fn poll_rejects_bad_handles(#[case] raw: Option<&str>, #[case] message: &str) {
        let f = fixture();
        let err = f.service.poll(raw).await.unwrap_err();
        assert_eq!(err, ApiError::InvalidParameter(message.to_string()));
    }

    #[tokio::test]
    async fn poll_unknown_handle_is_invalid_parameter() {
        let f = fixture();
        let unknown = TaskId::from_ulid(Ulid::new()).to_string();
        let err = f.service.poll(Some(unknown.as_str())).await.unwrap_err();
        assert_eq!(err, ApiError::InvalidParameter(INVALID_TASK_ID.to_string()));
    }

    #[tokio::test]
    async fn poll_maps_each_state() {
        let f = fixture();
        let submitted = f.service.submit(Some(2)).await.unwrap();
        let id = task_id(&submitted);
        let handle = Some(submitted.task_id.as_str());

        let pending = f.service.poll(handle).await.unwrap();
        assert_eq!(pending.state, PollState::Progress);
        assert_eq!(pending.progress, "0.0");
        assert_eq!(pending.result, None);

        f.store.claim(id).await.unwrap();
        let update = ProgressUpdate::from_checkpoint(Checkpoint {
            inside: 20,
            taken: 25,
            total: 100,
        });
        f.store.update_progress(id, update).await.unwrap();
        let running = f.service.poll(handle).await.unwrap();
        assert_eq!(running.state, PollState::Progress);
        assert_eq!(running.progress, "0.25");

        f.store.succeed(id, "3.14".to_string()).await.unwrap();
        let finished = f.service.poll(handle).await.unwrap();
        assert_eq!(finished.state, PollState::Finished);
        assert_eq!(finished.progress, "1.0");
        assert_eq!(finished.result.as_deref(), Some("3.14"));

        // idempotent once terminal
        assert_eq!(f.service.poll(handle).await.unwrap(), finished);
    }

    #[tokio::test]
    async fn failed_task_polls_as_failed() {
        let f = fixture();
        let submitted = f.service.submit(Some(2)).await.unwrap();
        let id = task_id(&submitted);
        f.store.claim(id).await.unwrap();
        f.store.fail(id, "sampler fault".to_string()).await.unwrap();

        let failed = f.service.poll(Some(submitted.task_id.as_str())).await.unwrap();
        assert_eq!(failed.state, PollState::Failed);
        assert_eq!(failed.progress, "0.0");
        assert_eq!(failed.result, None);
    }

    #[test]
    fn poll_response_serializes_null_result() {
        let response = PollResponse {
            state: PollState::Progress,
            progress: "0.0".to_string(),
            result: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"state": "PROGRESS", "progress": "0.0", "result": null})
        );
    }

    #[test]
    fn error_body_has_message_and_empty_errors() {
        let body = ApiError::InternalFault.body();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "message": "Request could not be processed, internal server error encountered",
                "errors": {}
            })
        );
        assert_eq!(ApiError::InternalFault.status_code(), 500);
    }

    struct BrokenQueue;

    #[async_trait]
    impl DeliveryQueue for BrokenQueue {
        async fn push(&self, _job: Job) -> Result<DeliveryId, QueueError> {
            Err(QueueError::OperationFailed("broker offline".to_string()))
        }

        async fn lease(&self, _timeout: Duration) -> Result<Option<Box<dyn JobLease>>, QueueError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn enqueue_failure_is_internal_fault_and_fails_the_task() {
        let store = Arc::new(InMemoryTaskStore::new());
        let service = TaskService::new(
            store.clone(),
            Arc::new(BrokenQueue),
            Arc::new(UlidGenerator::new(SystemClock)),
        );

        let err = service.submit(Some(3)).await.unwrap_err();
        assert_eq!(err, ApiError::InternalFault);
        assert_eq!(err.kind(), ErrorKind::InternalFault);

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 0);
    }

    #[test]
    fn health_reports_healthy() {
        let f = fixture();
        assert_eq!(
            serde_json::to_value(f.service.health()).unwrap(),
            serde_json::json!({
                "status": "healthy",
                "service": "π Calculator API",
                "message": "Ready to calculate π using Monte Carlo magic!"
            })
        );
    }
}
