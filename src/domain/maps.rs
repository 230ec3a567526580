//! Catalogue of piecewise-expanding maps used by the CLI and the tests.

use crate::domain::branch::Branch;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::interval::Interval;

/// Symmetric tent map `x -> a * min(x, 1 - x)`, `1 < a <= 2`.
pub fn tent_map(a: f64) -> DomainResult<Vec<Branch>> {
    if !(a > 1.0 && a <= 2.0) {
        return Err(DomainError::invalid("slope", format!("expected 1 < a <= 2, got {a}")));
    }
    Ok(vec![
        Branch::new(
            "L",
            Interval::new(0.0, 0.5)?,
            move |x| a * x,
            move |y| y / a,
            move |_| a,
        ),
        Branch::new(
            "R",
            Interval::new(0.5, 1.0)?,
            move |x| a * (1.0 - x),
            move |y| 1.0 - y / a,
            move |_| -a,
        ),
    ])
}

/// Skew tent map with its peak `height` at `peak`.
///
/// Both branches must be expanding: `height / peak > 1` and
/// `height / (1 - peak) > 1`.
pub fn skew_tent_map(peak: f64, height: f64) -> DomainResult<Vec<Branch>> {
    if !(peak > 0.0 && peak < 1.0) {
        return Err(DomainError::invalid("peak", format!("expected 0 < c < 1, got {peak}")));
    }
    if !(height > 0.0 && height <= 1.0) {
        return Err(DomainError::invalid("height", format!("expected 0 < h <= 1, got {height}")));
    }
    let left = height / peak;
    let right = height / (1.0 - peak);
    if left <= 1.0 || right <= 1.0 {
        return Err(DomainError::invalid(
            "height",
            format!("branches not expanding: slopes {left} and {right}"),
        ));
    }
    Ok(vec![
        Branch::new(
            "L",
            Interval::new(0.0, peak)?,
            move |x| left * x,
            move |y| y / left,
            move |_| left,
        ),
        Branch::new(
            "R",
            Interval::new(peak, 1.0)?,
            move |x| right * (1.0 - x),
            move |y| 1.0 - y / right,
            move |_| -right,
        ),
    ])
}
