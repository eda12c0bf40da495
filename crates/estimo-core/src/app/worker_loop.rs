//! WorkerLoop - タスク実行ループ
//!
//! # フロー
//! 1. DeliveryQueue::lease() で job を取得
//! 2. TaskStore::claim() で Pending → Running（再配送なら Running のまま）
//! 3. Handler を spawn_blocking で実行し、progress channel を registry に反映
//! 4. TaskStore::succeed() / fail() で終端状態へ
//! 5. lease を ack（registry が使えないときは release して再配送に任せる）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::handler::Handler;
use crate::domain::{ErrorKind, EstimatorJob, Job, TaskId};
use crate::kernel::KernelError;
use crate::ports::{Claim, DeliveryQueue, JobLease, StoreError, TaskStore};
use crate::progress::{self, ProgressUpdate};

/// Everything a worker needs, shared by all workers of a group.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn TaskStore>,
    pub queue: Arc<dyn DeliveryQueue>,
    pub handler: Arc<dyn Handler<EstimatorJob>>,
    pub lease_timeout: Duration,
}

/// Worker group handle.
/// - `request_shutdown` でワーカーは新しい lease を取らなくなる
/// - 実行中の kernel は止めない（cancel の仕組みは持たない）
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, ctx: WorkerContext) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let ctx = ctx.clone();
            let rx = shutdown_rx.clone();
            let join = tokio::spawn(
                worker_loop(ctx, rx).instrument(info_span!("worker", worker_id)),
            );
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            if let Err(e) = j.await {
                error!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop(ctx: WorkerContext, mut shutdown_rx: watch::Receiver<bool>) {
    debug!("worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // lease は待つ可能性があるので shutdown と競合させる
        let leased = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            leased = ctx.queue.lease(ctx.lease_timeout) => leased,
        };

        let lease = match leased {
            Ok(Some(lease)) => lease,
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "lease failed");
                tokio::time::sleep(ctx.lease_timeout).await;
                continue;
            }
        };

        let job = lease.job().clone();
        let outcome = execute(&ctx, job, lease.attempt()).await;
        if settle(lease, outcome).await == Settled::Released {
            // registry が戻るまで次の lease を待つ
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(ctx.lease_timeout) => {}
            }
        }
    }
    debug!("worker stopped");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Acked,
    Released,
}

/// Ack the lease unless the registry was unavailable; only that case is
/// worth redelivering.
async fn settle(lease: Box<dyn JobLease>, outcome: Result<(), StoreError>) -> Settled {
    let delivery_id = lease.delivery_id();
    let task_id = lease.job().task_id();
    match outcome {
        Err(StoreError::Unavailable(reason)) => {
            warn!(%delivery_id, %task_id, %reason, "registry unavailable; releasing job for redelivery");
            if let Err(e) = lease.release().await {
                error!(%delivery_id, error = %e, "release failed");
            }
            Settled::Released
        }
        outcome => {
            if let Err(e) = outcome {
                // 記録が消えた / 遷移できない job は再配送しても同じ結果になる
                warn!(%delivery_id, %task_id, error = %e, "dropping job the registry cannot take");
            }
            if let Err(e) = lease.ack().await {
                error!(%delivery_id, error = %e, "ack failed");
            }
            Settled::Acked
        }
    }
}

/// Run one delivered job. `Err` only when the registry itself failed; task
/// level failures end in the `Failed` state and return `Ok`.
pub(crate) async fn execute(ctx: &WorkerContext, job: Job, attempt: u32) -> Result<(), StoreError> {
    match job {
        Job::Estimate(job) => run_estimate(ctx, job, attempt).await,
    }
}

async fn run_estimate(ctx: &WorkerContext, job: EstimatorJob, attempt: u32) -> Result<(), StoreError> {
    let task_id = job.task_id;
    match ctx.store.claim(task_id).await? {
        Claim::AlreadyTerminal => {
            info!(%task_id, attempt, "task already finished; skipping redelivered job");
            return Ok(());
        }
        Claim::Reacquired => {
            warn!(%task_id, attempt, "task was already running; executing redelivered job again")
        }
        Claim::Acquired => info!(%task_id, precision = %job.precision, "task started"),
    }

    let (tx, mut rx) = progress::channel();
    let handler = Arc::clone(&ctx.handler);
    let kernel_job = job.clone();
    let mut run = tokio::task::spawn_blocking(move || handler.handle(&kernel_job, &tx));

    // mirror に失敗しても kernel の結果は待って終端遷移を試みる
    let mut mirroring = true;
    let joined = loop {
        tokio::select! {
            biased;
            joined = &mut run => break joined,
            changed = rx.changed(), if mirroring => match changed {
                Ok(()) => {
                    if let Some(update) = rx.latest() {
                        mirroring = mirror(ctx, task_id, update).await;
                    }
                }
                Err(_) => mirroring = false,
            },
        }
    };

    let terminal = match outcome(joined) {
        Ok(result) => {
            let stored = ctx.store.succeed(task_id, result.clone()).await;
            if stored.is_ok() {
                info!(%task_id, %result, "task succeeded");
            }
            stored
        }
        Err(summary) => {
            error!(%task_id, kind = %ErrorKind::ComputationFailure, error = %summary, "task failed");
            ctx.store.fail(task_id, summary).await
        }
    };

    match terminal {
        Err(StoreError::InvalidTransition(t)) => {
            warn!(%task_id, from = %t.from, "task already terminal; discarding this execution");
            Ok(())
        }
        other => other,
    }
}

/// Copy one update into the registry. Returns whether mirroring should go on.
async fn mirror(ctx: &WorkerContext, task_id: TaskId, update: ProgressUpdate) -> bool {
    match ctx.store.update_progress(task_id, update).await {
        Ok(_) => true,
        Err(StoreError::InvalidTransition(t)) => {
            // 並行して動いた別の実行が先に終端状態にした
            debug!(%task_id, state = %t.from, "progress no longer accepted");
            false
        }
        Err(e) => {
            warn!(%task_id, error = %e, "progress mirroring stopped");
            false
        }
    }
}

/// Map the blocking task's result to a result string or an opaque summary.
fn outcome(joined: Result<Result<String, KernelError>, JoinError>) -> Result<String, String> {
    match joined {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) if e.is_panic() => Err("estimator panicked".to_string()),
        Err(_) => Err("estimator was cancelled".to_string()),
    }
}
