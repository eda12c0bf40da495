//! Exact decimal rendering of the final estimate.
//!
//! The estimate `4 * inside / taken` is a rational number, so it is expanded
//! by long division on integers and rounded half-to-even on the exact
//! remainder. No intermediate float or truncated decimal is involved.

use super::KernelError;
use crate::domain::Precision;

/// Render `4 * inside / taken` with exactly `precision` fractional digits,
/// rounding half to even.
pub fn finalize(inside: u64, taken: u64, precision: Precision) -> Result<String, KernelError> {
    if taken == 0 {
        return Err(KernelError::NoSamples);
    }
    if inside > taken {
        return Err(KernelError::InconsistentCounters { inside, taken });
    }
    Ok(round_ratio(4 * u128::from(inside), u128::from(taken), precision.digits()))
}

/// `num / den` to `digits` fractional digits, half-to-even. `den` must be
/// non-zero and fit in a `u64` so that `rem * 10` cannot overflow.
fn round_ratio(num: u128, den: u128, digits: u32) -> String {
    let mut whole = num / den;
    let mut rem = num % den;

    let mut frac: Vec<u8> = Vec::with_capacity(digits as usize);
    for _ in 0..digits {
        rem *= 10;
        frac.push((rem / den) as u8);
        rem %= den;
    }

    let last_is_odd = match frac.last() {
        Some(d) => d % 2 == 1,
        None => whole % 2 == 1,
    };
    let twice = rem * 2;
    if twice > den || (twice == den && last_is_odd) {
        let mut carry = true;
        for d in frac.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            whole += 1;
        }
    }

    let mut out = whole.to_string();
    if !frac.is_empty() {
        out.push('.');
        out.extend(frac.iter().map(|d| char::from(b'0' + d)));
    }
    out
}
