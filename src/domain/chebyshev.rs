//! Chebyshev collocation of a transfer operator on one pair of domains.
//!
//! A block maps Chebyshev coefficients on a source domain to Chebyshev
//! coefficients on a target domain. Each basis polynomial `T_n` (restricted to
//! the source) is pushed through the operator, sampled at the Chebyshev nodes
//! of the target, and converted back to coefficients with a DCT-II.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::interval::Interval;
use crate::domain::operator::TransferOperator;

/// Chebyshev nodes `x_k = cos(pi (2k+1) / (2K))`, `k = 0..K`.
pub fn chebyshev_nodes(k: usize) -> Vec<f64> {
    (0..k)
        .map(|i| ((2 * i + 1) as f64 * PI / (2 * k) as f64).cos())
        .collect()
}

/// `T_n(x)` by the three-term recurrence, valid outside `[-1, 1]` too.
pub fn chebyshev_t(n: usize, x: f64) -> f64 {
    match n {
        0 => 1.0,
        1 => x,
        _ => {
            let mut t_prev = 1.0;
            let mut t_curr = x;
            for _ in 2..=n {
                let t_next = 2.0 * x * t_curr - t_prev;
                t_prev = t_curr;
                t_curr = t_next;
            }
            t_curr
        }
    }
}

/// `T_n` composed with the affine map from `domain` onto `[-1, 1]`.
pub fn domain_restricted_chebyt(n: usize, domain: Interval) -> impl Fn(f64) -> f64 {
    move |x| chebyshev_t(n, domain.inverse_linear_map(x))
}

/// DCT-II along each row, divided by the row length, first column halved.
///
/// Applied to samples at the Chebyshev nodes this yields the Chebyshev
/// interpolation coefficients of each row.
pub fn dct_normalized(samples: &DMatrix<f64>) -> DMatrix<f64> {
    let len = samples.ncols();
    let scale = len as f64;
    DMatrix::from_fn(samples.nrows(), len, |r, j| {
        let sum: f64 = (0..len)
            .map(|c| {
                samples[(r, c)] * (PI * j as f64 * (2 * c + 1) as f64 / (2 * len) as f64).cos()
            })
            .sum();
        let coeff = 2.0 * sum / scale;
        if j == 0 {
            coeff / 2.0
        } else {
            coeff
        }
    })
}

/// Chebyshev block of `operator` from `source` to `target`.
///
/// Returns a `K x N` matrix: column `n` holds the `K` Chebyshev coefficients
/// (on `target`) of the operator applied to `T_n` (on `source`).
///
/// `passes > 1` re-applies [`dct_normalized`] to the coefficient matrix
/// `passes - 1` more times. That is a repeated transform of the coefficients,
/// not a more accurate discretisation of the operator.
#[instrument(level = "trace", skip(operator))]
pub fn approximate(
    operator: &dyn TransferOperator,
    k: usize,
    n: usize,
    source: Interval,
    target: Interval,
    passes: usize,
) -> DomainResult<DMatrix<f64>> {
    if k != n {
        return Err(DomainError::OrderMismatch { k, n });
    }
    if k == 0 {
        return Err(DomainError::invalid("order", "must be at least 1"));
    }
    if passes == 0 {
        return Err(DomainError::invalid("refinement passes", "must be at least 1"));
    }

    let nodes: Vec<f64> = chebyshev_nodes(k)
        .into_iter()
        .map(|t| target.linear_map(t))
        .collect();

    let mut samples = DMatrix::<f64>::zeros(n, k);
    for degree in 0..n {
        let basis = domain_restricted_chebyt(degree, source);
        for (col, &x) in nodes.iter().enumerate() {
            samples[(degree, col)] = operator.evaluate(&basis, x)?;
        }
    }

    let mut coeffs = dct_normalized(&samples);
    for pass in 1..passes {
        trace!(pass, "extra coefficient DCT pass");
        coeffs = dct_normalized(&coeffs);
    }

    Ok(coeffs.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::branch::Branch;
    use crate::domain::operator::{IdentityOperator, WeightedComposition};

    fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
        (a - b).iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    #[test]
    fn given_recurrence_when_inside_unit_interval_then_matches_cosine_form() {
        for n in 0..8 {
            for &x in &[-0.9, -0.3, 0.0, 0.42, 1.0] {
                let closed = (n as f64 * f64::acos(x)).cos();
                assert!((chebyshev_t(n, x) - closed).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn given_identity_on_same_domain_when_approximating_then_identity_block() {
        let d = Interval::new(0.2, 0.7).unwrap();
        let block = approximate(&IdentityOperator, 6, 6, d, d, 1).unwrap();
        assert!(max_abs_diff(&block, &DMatrix::identity(6, 6)) < 1e-12);
    }

    #[test]
    fn given_k_not_equal_n_when_approximating_then_order_mismatch() {
        let d = Interval::unit();
        let err = approximate(&IdentityOperator, 4, 5, d, d, 1).unwrap_err();
        assert_eq!(err, DomainError::OrderMismatch { k: 4, n: 5 });
    }

    #[test]
    fn given_two_passes_when_approximating_then_differs_from_one_pass() {
        let d = Interval::unit();
        let once = approximate(&IdentityOperator, 4, 4, d, d, 1).unwrap();
        let twice = approximate(&IdentityOperator, 4, 4, d, d, 2).unwrap();
        let manual = dct_normalized(&once.transpose()).transpose();
        assert!(max_abs_diff(&twice, &manual) < 1e-15);
        assert!(max_abs_diff(&once, &twice) > 1e-3);
    }

    #[test]
    fn given_doubling_branch_when_approximating_then_constant_maps_to_half() {
        // L 1 = 1/2 on the image of [0, 1/2]
        let branch = Branch::new(
            "L",
            Interval::new(0.0, 0.5).unwrap(),
            |x| 2.0 * x,
            |y| y / 2.0,
            |_| 2.0,
        );
        let op = WeightedComposition::new(branch);
        let block =
            approximate(&op, 5, 5, Interval::new(0.0, 0.5).unwrap(), Interval::unit(), 1).unwrap();
        assert!((block[(0, 0)] - 0.5).abs() < 1e-12);
        for row in 1..5 {
            assert!(block[(row, 0)].abs() < 1e-12);
        }
        // T_1 on [0, 1/2] composed with y/2 is T_1 on [0, 1]
        assert!((block[(1, 1)] - 0.5).abs() < 1e-12);
    }
}
