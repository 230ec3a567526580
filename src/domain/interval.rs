//! Closed real intervals and their canonical identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Closed interval `[start, end]` with `start < end`.
///
/// Two intervals are the same domain iff both bounds are bit-identical.
/// Bounds coming out of the tower are canonicalised first (see [`Precision`]),
/// so "bit-identical" means "equal at the configured precision".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> DomainResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::invalid(
                "interval",
                format!("bounds must be finite, got ({start}, {end})"),
            ));
        }
        if start >= end {
            return Err(DomainError::invalid(
                "interval",
                format!("start must be below end, got ({start}, {end})"),
            ));
        }
        Ok(Self::from_bounds(start, end))
    }

    /// The unit interval `[0, 1]`, root of every tower.
    pub fn unit() -> Self {
        Self::from_bounds(0.0, 1.0)
    }

    fn from_bounds(start: f64, end: f64) -> Self {
        // -0.0 and 0.0 must hash alike
        Self {
            start: start + 0.0,
            end: end + 0.0,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn contains(&self, x: f64) -> bool {
        self.start <= x && x <= self.end
    }

    /// Interval intersection; `None` when `max(starts) >= min(ends)`.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Self::from_bounds(start, end))
        } else {
            None
        }
    }

    /// Interval spanned by two image values, in either order.
    ///
    /// Returns `None` when both values coincide after canonicalisation.
    pub fn spanned(a: f64, b: f64, precision: Precision) -> Option<Interval> {
        let lo = precision.round(a.min(b));
        let hi = precision.round(a.max(b));
        if lo < hi {
            Some(Self::from_bounds(lo, hi))
        } else {
            None
        }
    }

    pub fn canonical(&self, precision: Precision) -> Interval {
        Self::from_bounds(precision.round(self.start), precision.round(self.end))
    }

    /// Map `t` from `[-1, 1]` onto this interval.
    pub fn linear_map(&self, t: f64) -> f64 {
        self.start + (t + 1.0) * (self.end - self.start) / 2.0
    }

    /// Map `x` from this interval onto `[-1, 1]`.
    pub fn inverse_linear_map(&self, x: f64) -> f64 {
        2.0 * (x - self.start) / (self.end - self.start) - 1.0
    }

    fn key(&self) -> (u64, u64) {
        (self.start.to_bits(), self.end.to_bits())
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Interval {}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Rounding applied to domain bounds before they are compared.
///
/// `Precision::Exact` keeps raw bits; `Precision::Decimals(d)` rounds to `d`
/// decimal digits so that `0.18000000000000002` and `0.18` are one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Exact,
    Decimals(u32),
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Decimals(12)
    }
}

impl Precision {
    pub fn round(&self, x: f64) -> f64 {
        match *self {
            Precision::Exact => x + 0.0,
            Precision::Decimals(d) => {
                let scale = 10f64.powi(d as i32);
                let rounded = (x * scale).round() / scale;
                // huge magnitudes overflow the scaling; keep them untouched
                if rounded.is_finite() {
                    rounded + 0.0
                } else {
                    x
                }
            }
        }
    }
}
