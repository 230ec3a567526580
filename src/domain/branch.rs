//! Branches of a piecewise map and the piecewise evaluator built from them.

use std::fmt;
use std::sync::Arc;

use crate::domain::error::{finite, DomainError, DomainResult};
use crate::domain::interval::Interval;

/// Shared scalar function `f64 -> f64`.
pub type ScalarFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// One monotone piece of a piecewise-expanding map.
///
/// `function` is defined on `domain`; `inverse` and `derivative` are used on
/// the branch image to build the transfer action.
#[derive(Clone)]
pub struct Branch {
    pub name: String,
    pub domain: Interval,
    function: ScalarFn,
    inverse: ScalarFn,
    derivative: ScalarFn,
}

impl Branch {
    pub fn new<F, I, D>(
        name: impl Into<String>,
        domain: Interval,
        function: F,
        inverse: I,
        derivative: D,
    ) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
        I: Fn(f64) -> f64 + Send + Sync + 'static,
        D: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            domain,
            function: Arc::new(function),
            inverse: Arc::new(inverse),
            derivative: Arc::new(derivative),
        }
    }

    pub fn eval(&self, x: f64) -> DomainResult<f64> {
        finite((self.function)(x), "branch function", x)
    }

    pub fn eval_inverse(&self, y: f64) -> DomainResult<f64> {
        finite((self.inverse)(y), "branch inverse", y)
    }

    pub fn eval_derivative(&self, x: f64) -> DomainResult<f64> {
        finite((self.derivative)(x), "branch derivative", x)
    }

    /// The functions the transfer action depends on.
    pub(crate) fn transfer_parts(&self) -> Vec<ScalarFn> {
        vec![Arc::clone(&self.inverse), Arc::clone(&self.derivative)]
    }
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// The full map assembled from its branches.
///
/// A point is evaluated by the first branch whose closed domain contains it,
/// so shared endpoints belong to the earlier branch.
#[derive(Debug, Clone)]
pub struct PiecewiseMap {
    branches: Vec<Branch>,
}

impl PiecewiseMap {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self { branches }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn eval(&self, x: f64) -> DomainResult<f64> {
        self.branches
            .iter()
            .find(|b| b.domain.contains(x))
            .ok_or(DomainError::OutsideDomain(x))
            .and_then(|b| b.eval(x))
    }
}
