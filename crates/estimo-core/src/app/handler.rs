//! Handler - job を実行する同期的な処理
//!
//! kernel は CPU を占有するので、worker は handler を `spawn_blocking` の上で
//! 呼びます。そのため trait は async ではありません。

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::domain::EstimatorJob;
use crate::kernel::{self, KernelError};
use crate::progress::{ProgressSender, ProgressUpdate};

/// Handler runs one job of type `J` to completion.
///
/// Intermediate progress goes to `progress`; the returned string is the
/// task result.
pub trait Handler<J>: Send + Sync {
    fn handle(&self, job: &J, progress: &ProgressSender) -> Result<String, KernelError>;
}

/// Runs the Monte Carlo kernel for an [`EstimatorJob`].
#[derive(Debug, Clone, Default)]
pub struct MonteCarloHandler {
    seed: Option<u64>,
}

impl MonteCarloHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every run uses the same seed, so equal precisions give equal results.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Handler<EstimatorJob> for MonteCarloHandler {
    fn handle(&self, job: &EstimatorJob, progress: &ProgressSender) -> Result<String, KernelError> {
        let shown = (job.precision.digits() as usize + 2).min(10);
        kernel::run(job.precision, self.rng(), |checkpoint| {
            if progress.publish(ProgressUpdate::from_checkpoint(checkpoint)) {
                debug!(
                    task_id = %job.task_id,
                    progress = %format!("{:.1}%", checkpoint.fraction_complete() * 100.0),
                    estimate = %format!("{:.shown$}", checkpoint.estimate()),
                    inside = checkpoint.inside,
                    taken = checkpoint.taken,
                    total = checkpoint.total,
                    "checkpoint"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Precision, TaskId};
    use crate::progress;
    use ulid::Ulid;

    fn job(digits: i64) -> EstimatorJob {
        EstimatorJob::new(TaskId::from_ulid(Ulid::new()), Precision::new(digits).unwrap())
    }

    #[test]
    fn publishes_progress_below_one_and_returns_formatted_result() {
        let (tx, mut rx) = progress::channel();
        let result = MonteCarloHandler::with_seed(3).handle(&job(2), &tx).unwrap();

        let last = rx.latest().unwrap();
        assert!(last.fraction > 0.99 && last.fraction < 1.0);
        assert_eq!(result.split_once('.').unwrap().1.len(), 2);
    }

    #[test]
    fn seeded_handler_is_reproducible() {
        let handler = MonteCarloHandler::with_seed(17);
        let (tx, _rx) = progress::channel();
        let a = handler.handle(&job(2), &tx).unwrap();
        let (tx, _rx) = progress::channel();
        let b = handler.handle(&job(2), &tx).unwrap();
        assert_eq!(a, b);
    }
}
