//! InMemoryDeliveryQueue - プロセス内の broker
//!
//! # 実装詳細
//! - `ready`: 配送待ちの job（FIFO）
//! - `in_flight`: lease 中の job。ack で消え、release / drop で `ready` に戻る
//! - std の Mutex はロック区間が短く await を跨がないので、lease の Drop からも使える
//! - Notify で push / release 時に待機中の worker を起こす

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::domain::{DeliveryId, Job};
use crate::ports::{DeliveryQueue, IdGenerator, JobLease, QueueError};

#[derive(Debug, Clone)]
struct Pending {
    delivery_id: DeliveryId,
    job: Job,
    attempts: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<Pending>,
    in_flight: HashMap<DeliveryId, Pending>,
}

impl QueueState {
    fn requeue(&mut self, delivery_id: DeliveryId) -> bool {
        match self.in_flight.remove(&delivery_id) {
            Some(pending) => {
                self.ready.push_back(pending);
                true
            }
            None => false,
        }
    }
}

fn lock(state: &Mutex<QueueState>) -> Result<MutexGuard<'_, QueueState>, QueueError> {
    state
        .lock()
        .map_err(|e| QueueError::OperationFailed(format!("queue lock poisoned: {e}")))
}

pub struct InMemoryDeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryDeliveryQueue {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            notify: Arc::new(Notify::new()),
            ids,
        }
    }

    /// Jobs waiting to be leased.
    pub fn ready_len(&self) -> usize {
        self.state.lock().map(|s| s.ready.len()).unwrap_or(0)
    }

    /// Jobs leased but not yet acknowledged.
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().map(|s| s.in_flight.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn push(&self, job: Job) -> Result<DeliveryId, QueueError> {
        let delivery_id = self.ids.generate_delivery_id();
        lock(&self.state)?.ready.push_back(Pending {
            delivery_id,
            job,
            attempts: 0,
        });
        self.notify.notify_one();
        Ok(delivery_id)
    }

    async fn lease(&self, timeout: Duration) -> Result<Option<Box<dyn JobLease>>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut state = lock(&self.state)?;
                if let Some(mut pending) = state.ready.pop_front() {
                    pending.attempts += 1;
                    state.in_flight.insert(pending.delivery_id, pending.clone());
                    debug!(
                        delivery_id = %pending.delivery_id,
                        task_id = %pending.job.task_id(),
                        attempt = pending.attempts,
                        "job leased"
                    );
                    return Ok(Some(Box::new(InMemoryLease {
                        pending,
                        state: Arc::clone(&self.state),
                        notify: Arc::clone(&self.notify),
                        settled: false,
                    })));
                }
            }

            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }
}

struct InMemoryLease {
    pending: Pending,
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    settled: bool,
}

#[async_trait]
impl JobLease for InMemoryLease {
    fn delivery_id(&self) -> DeliveryId {
        self.pending.delivery_id
    }

    fn job(&self) -> &Job {
        &self.pending.job
    }

    fn attempt(&self) -> u32 {
        self.pending.attempts
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        let mut this = self;
        this.settled = true;
        lock(&this.state)?.in_flight.remove(&this.pending.delivery_id);
        Ok(())
    }

    async fn release(self: Box<Self>) -> Result<(), QueueError> {
        let mut this = self;
        this.settled = true;
        let requeued = lock(&this.state)?.requeue(this.pending.delivery_id);
        if requeued {
            this.notify.notify_one();
        }
        Ok(())
    }
}

impl Drop for InMemoryLease {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // 未 ack のまま捨てられた lease は再配送する
        match self.state.lock() {
            Ok(mut state) => {
                if state.requeue(self.pending.delivery_id) {
                    warn!(
                        delivery_id = %self.pending.delivery_id,
                        task_id = %self.pending.job.task_id(),
                        "lease dropped without ack; job requeued"
                    );
                    self.notify.notify_one();
                }
            }
            Err(_) => warn!(
                delivery_id = %self.pending.delivery_id,
                "lease dropped with poisoned queue; job lost"
            ),
        }
    }
}
