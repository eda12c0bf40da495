//! Monte Carlo circle-ratio estimator.
//!
//! Darts `(x, y)` are drawn uniformly from the unit square; the fraction that
//! lands inside the quarter circle `x² + y² ≤ 1` approaches π/4.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Precision;

/// Upper bound on the number of checkpoints one run emits.
pub const CHECKPOINT_TARGET: u64 = 10_000;

/// Counters at one point of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Samples that landed inside the circle.
    pub inside: u64,
    /// Samples taken so far.
    pub taken: u64,
    /// Samples the run will take in total.
    pub total: u64,
}

impl Checkpoint {
    /// `taken / total`, in `[0.0, 1.0]`.
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.taken as f64 / self.total as f64
    }

    pub fn is_final(&self) -> bool {
        self.taken >= self.total
    }

    /// Running estimate `4 * inside / taken` as a float, for logging only.
    pub fn estimate(&self) -> f64 {
        if self.taken == 0 {
            return 0.0;
        }
        4.0 * self.inside as f64 / self.taken as f64
    }
}

/// Total sample count for a precision: `10^(2 * digits)`.
///
/// Saturates at `u64::MAX` from 10 digits upward.
pub fn total_samples(precision: Precision) -> u64 {
    10u64
        .checked_pow(2 * precision.digits())
        .unwrap_or(u64::MAX)
}

/// Samples between two checkpoints.
pub fn checkpoint_interval(total: u64) -> u64 {
    (total / CHECKPOINT_TARGET).max(1)
}

/// Lazy sequence of checkpoints for one run.
///
/// Each call to `next` draws samples up to the next checkpoint boundary.
/// The last item has `taken == total`.
pub struct Estimator<R> {
    rng: R,
    interval: u64,
    inside: u64,
    taken: u64,
    total: u64,
}

impl<R: Rng> Estimator<R> {
    pub fn new(precision: Precision, rng: R) -> Self {
        Self::with_total(total_samples(precision), rng)
    }

    pub fn with_total(total: u64, rng: R) -> Self {
        Self {
            rng,
            interval: checkpoint_interval(total),
            inside: 0,
            taken: 0,
            total,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            inside: self.inside,
            taken: self.taken,
            total: self.total,
        }
    }

    fn sample(&mut self) {
        let x: f64 = self.rng.r#gen();
        let y: f64 = self.rng.r#gen();
        if x * x + y * y <= 1.0 {
            self.inside += 1;
        }
        self.taken += 1;
    }
}

impl<R: Rng> Iterator for Estimator<R> {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Checkpoint> {
        if self.taken >= self.total {
            return None;
        }
        let boundary = (self.taken / self.interval + 1)
            .saturating_mul(self.interval)
            .min(self.total);
        while self.taken < boundary {
            self.sample();
        }
        Some(self.checkpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    #[case(1, 100)]
    #[case(2, 10_000)]
    #[case(3, 1_000_000)]
    #[case(9, 1_000_000_000_000_000_000)]
    #[case(10, u64::MAX)]
    #[case(200, u64::MAX)]
    fn total_samples_is_ten_to_twice_precision(#[case] digits: i64, #[case] expected: u64) {
        assert_eq!(total_samples(Precision::new(digits).unwrap()), expected);
    }

    #[rstest]
    #[case(100, 1)]
    #[case(10_000, 1)]
    #[case(1_000_000, 100)]
    #[case(u64::MAX, u64::MAX / 10_000)]
    fn interval_bounds_emissions(#[case] total: u64, #[case] interval: u64) {
        assert_eq!(checkpoint_interval(total), interval);
    }

    #[test]
    fn emits_bounded_monotonic_checkpoints_ending_at_total() {
        let est = Estimator::new(Precision::new(3).unwrap(), StdRng::seed_from_u64(7));
        let checkpoints: Vec<_> = est.collect();

        assert_eq!(checkpoints.len() as u64, CHECKPOINT_TARGET);
        assert!(checkpoints.windows(2).all(|w| w[0].taken < w[1].taken));
        assert!(
            checkpoints
                .windows(2)
                .all(|w| w[0].fraction_complete() < w[1].fraction_complete())
        );

        let last = checkpoints.last().unwrap();
        assert!(last.is_final());
        assert_eq!(last.taken, 1_000_000);
        assert_eq!(last.fraction_complete(), 1.0);
        assert!(checkpoints[..checkpoints.len() - 1].iter().all(|c| !c.is_final()));
    }

    #[test]
    fn small_runs_emit_every_sample() {
        let est = Estimator::new(Precision::new(1).unwrap(), StdRng::seed_from_u64(1));
        let checkpoints: Vec<_> = est.collect();
        assert_eq!(checkpoints.len(), 100);
        assert!(checkpoints.iter().all(|c| c.inside <= c.taken));
    }

    #[test]
    fn uneven_totals_still_finish_exactly() {
        let est = Estimator::with_total(25_003, StdRng::seed_from_u64(3));
        let last = est.last().unwrap();
        assert_eq!(last.taken, 25_003);
    }

    #[test]
    fn same_seed_same_counters() {
        let a = Estimator::new(Precision::new(2).unwrap(), StdRng::seed_from_u64(42))
            .last()
            .unwrap();
        let b = Estimator::new(Precision::new(2).unwrap(), StdRng::seed_from_u64(42))
            .last()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn estimate_converges_near_pi() {
        let last = Estimator::new(Precision::new(3).unwrap(), StdRng::seed_from_u64(11))
            .last()
            .unwrap();
        // 10^6 samples: standard error is about 0.0016.
        assert!((last.estimate() - std::f64::consts::PI).abs() < 0.01);
    }
}
