//! Jobs carried by the broker from submission to a worker.

use serde::{Deserialize, Serialize};

use super::{Precision, TaskId};

/// A unit of work on the delivery queue.
///
/// Job kinds are variants, not strings: a worker matches on the variant and
/// the compiler keeps dispatch exhaustive. New computations add a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    Estimate(EstimatorJob),
}

impl Job {
    pub fn task_id(&self) -> TaskId {
        match self {
            Job::Estimate(job) => job.task_id,
        }
    }
}

/// Monte Carlo estimation of π to `precision` fractional digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorJob {
    pub task_id: TaskId,
    pub precision: Precision,
}

impl EstimatorJob {
    pub fn new(task_id: TaskId, precision: Precision) -> Self {
        Self {
            task_id,
            precision,
        }
    }
}

impl From<EstimatorJob> for Job {
    fn from(job: EstimatorJob) -> Self {
        Job::Estimate(job)
    }
}
