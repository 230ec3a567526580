//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent numerical or parameter violations in the core
/// algorithms. These are independent of configuration and I/O concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("collocation order mismatch: K={k} but N={n} (only K == N is supported)")]
    OrderMismatch { k: usize, n: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("non-finite value from {what} at x={at}")]
    NonFiniteEvaluation { what: &'static str, at: f64 },

    #[error("x={0} is not in any branch domain")]
    OutsideDomain(f64),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

impl DomainError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Reject NaN and infinities produced by caller-supplied functions.
pub(crate) fn finite(value: f64, what: &'static str, at: f64) -> DomainResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NonFiniteEvaluation { what, at })
    }
}
