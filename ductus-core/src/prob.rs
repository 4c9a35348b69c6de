//! Log-space probability type for numerically stable computation.
//!
//! [`LogProb`] represents probabilities as natural logarithms, preventing
//! underflow in chains of small probabilities such as the joint probability
//! of a long label sequence.

use crate::{DuctusError, Result};

/// A probability stored as its natural logarithm: `ln(p)`.
///
/// All values are ≤ 0 (since 0 < p ≤ 1), with 0.0 representing certainty
/// (p = 1) and negative infinity representing impossibility (p = 0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LogProb(pub f64);

impl LogProb {
    /// Create a [`LogProb`] from a raw probability in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is not in `(0, 1]`.
    pub fn from_prob(p: f64) -> Result<Self> {
        if p <= 0.0 || p > 1.0 {
            return Err(DuctusError::InvalidInput(
                "LogProb::from_prob: p must be in (0, 1]".into(),
            ));
        }
        Ok(Self(p.ln()))
    }

    /// Convert back to a raw probability.
    pub fn to_prob(self) -> f64 {
        self.0.exp()
    }

    /// Multiply two probabilities in log-space (addition of log values).
    pub fn ln_mul(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Certain event: `ln(1) = 0`.
    pub const fn certain() -> Self {
        Self(0.0)
    }

    /// Impossible event: `ln(0) = -∞`.
    pub const fn impossible() -> Self {
        Self(f64::NEG_INFINITY)
    }
}
