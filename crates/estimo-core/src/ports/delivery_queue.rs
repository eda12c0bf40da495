//! DeliveryQueue port - broker（submit から worker への配送）
//!
//! 必要なのは at-least-once 配送だけです。
//! - lease した job は `ack` するまで配送済みになりません
//! - `ack` されずに戻された（`release` / drop）job は再配送されます
//!
//! 状態は TaskStore が持ちます。DeliveryQueue は job を運ぶだけです。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DeliveryId, Job};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// A leased job. The worker owns this lease and must either `ack` or
/// `release` it; a lease dropped without either is redelivered.
#[async_trait]
pub trait JobLease: Send {
    fn delivery_id(&self) -> DeliveryId;

    fn job(&self) -> &Job;

    /// How many times this job has been leased, this lease included.
    fn attempt(&self) -> u32;

    /// Delivery done; the job is removed from the queue.
    async fn ack(self: Box<Self>) -> Result<(), QueueError>;

    /// Put the job back for redelivery.
    async fn release(self: Box<Self>) -> Result<(), QueueError>;
}

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn push(&self, job: Job) -> Result<DeliveryId, QueueError>;

    /// Lease one job, waiting up to `timeout`. `Ok(None)` on timeout.
    async fn lease(&self, timeout: Duration) -> Result<Option<Box<dyn JobLease>>, QueueError>;
}
