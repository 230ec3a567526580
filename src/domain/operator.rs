//! Function-to-function operators applied by the Chebyshev approximator.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::branch::{Branch, ScalarFn};
use crate::domain::error::{finite, DomainResult};

/// Identity of an operator built from shared scalar functions.
///
/// Compares the addresses of the underlying functions. Holding the `Arc`s
/// keeps those addresses alive, so a key can never match a different
/// operator allocated later at the same place.
#[derive(Clone)]
pub struct OperatorKey {
    parts: Vec<ScalarFn>,
}

impl OperatorKey {
    pub fn new(parts: Vec<ScalarFn>) -> Self {
        Self { parts }
    }

    fn addresses(&self) -> impl Iterator<Item = usize> + '_ {
        self.parts.iter().map(|f| Arc::as_ptr(f) as *const () as usize)
    }
}

impl PartialEq for OperatorKey {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len() && self.addresses().eq(other.addresses())
    }
}

impl Eq for OperatorKey {}

impl Hash for OperatorKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for addr in self.addresses() {
            addr.hash(state);
        }
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.addresses().map(|a| format!("{a:#x}")))
            .finish()
    }
}

/// A linear operator on scalar functions, evaluated pointwise.
///
/// `evaluate(phi, x)` returns `(L phi)(x)`. Implementations are value types;
/// nothing is captured from the caller's environment.
pub trait TransferOperator: Send + Sync {
    fn evaluate(&self, phi: &dyn Fn(f64) -> f64, x: f64) -> DomainResult<f64>;

    /// Stable identity for caching blocks; `None` disables caching.
    fn key(&self) -> Option<OperatorKey> {
        None
    }

    /// Bind `phi` and return `L phi` as a fallible scalar function.
    fn apply<'a>(&'a self, phi: &'a dyn Fn(f64) -> f64) -> Box<dyn Fn(f64) -> DomainResult<f64> + 'a>
    where
        Self: Sized,
    {
        Box::new(move |x| self.evaluate(phi, x))
    }
}

/// Weighted composition `(L phi)(x) = phi(g(x)) / |f'(g(x))|`, with `g` the
/// inverse branch and `f'` the branch derivative.
#[derive(Debug, Clone)]
pub struct WeightedComposition {
    branch: Branch,
}

impl WeightedComposition {
    pub fn new(branch: Branch) -> Self {
        Self { branch }
    }
}

impl TransferOperator for WeightedComposition {
    fn evaluate(&self, phi: &dyn Fn(f64) -> f64, x: f64) -> DomainResult<f64> {
        let pre = self.branch.eval_inverse(x)?;
        let slope = self.branch.eval_derivative(pre)?.abs();
        finite(phi(pre) / slope, "weighted composition", x)
    }

    fn key(&self) -> Option<OperatorKey> {
        Some(OperatorKey::new(self.branch.transfer_parts()))
    }
}

/// `L phi = phi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOperator;

impl TransferOperator for IdentityOperator {
    fn evaluate(&self, phi: &dyn Fn(f64) -> f64, x: f64) -> DomainResult<f64> {
        finite(phi(x), "identity", x)
    }
}
