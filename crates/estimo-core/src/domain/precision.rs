//! Requested number of fractional digits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits a task estimates to.
///
/// Construction goes through [`Precision::new`], so a value of this type is
/// always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Precision(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("precision must be between 1 and 200, got {0}")]
pub struct PrecisionOutOfRange(pub i64);

impl Precision {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 200;

    pub fn new(digits: i64) -> Result<Self, PrecisionOutOfRange> {
        if digits < i64::from(Self::MIN) || digits > i64::from(Self::MAX) {
            return Err(PrecisionOutOfRange(digits));
        }
        Ok(Self(digits as u32))
    }

    pub fn digits(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Precision {
    type Error = PrecisionOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Precision> for u32 {
    fn from(p: Precision) -> Self {
        p.0
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
