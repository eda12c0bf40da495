//! Kernel - 純粋な数値計算
//!
//! kernel は queue / registry / runtime を知りません。
//! checkpoint を callback に渡し、最後に decimal 文字列を返すだけです。

mod decimal;
mod estimator;

pub use decimal::finalize;
pub use estimator::{
    CHECKPOINT_TARGET, Checkpoint, Estimator, checkpoint_interval, total_samples,
};

use rand::Rng;

use crate::domain::Precision;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("estimator finished without taking any samples")]
    NoSamples,

    #[error("inconsistent counters: inside={inside} taken={taken}")]
    InconsistentCounters { inside: u64, taken: u64 },
}

/// Run one estimation to completion.
///
/// `on_checkpoint` sees every intermediate checkpoint; the final one is
/// consumed here and turned into the result string.
pub fn run<R, F>(precision: Precision, rng: R, mut on_checkpoint: F) -> Result<String, KernelError>
where
    R: Rng,
    F: FnMut(Checkpoint),
{
    let mut last = None;
    for checkpoint in Estimator::new(precision, rng) {
        if !checkpoint.is_final() {
            on_checkpoint(checkpoint);
        }
        last = Some(checkpoint);
    }
    let last = last.ok_or(KernelError::NoSamples)?;
    finalize(last.inside, last.taken, precision)
}
