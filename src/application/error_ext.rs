//! Error conversion helpers for domain computations
//!
//! Provides an extension trait that names the step a domain error came from.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainResult;

/// Extension trait for converting `DomainResult` to `ApplicationResult` with context.
pub trait DomainResultExt<T> {
    /// Attach the step that failed.
    ///
    /// # Example
    /// ```ignore
    /// builder.build(&branches, depth)
    ///     .with_step_context("build tower", depth)?;
    /// ```
    fn with_step_context(self, step: &str, detail: impl std::fmt::Display) -> ApplicationResult<T>;
}

impl<T> DomainResultExt<T> for DomainResult<T> {
    fn with_step_context(self, step: &str, detail: impl std::fmt::Display) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", step, detail),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn given_domain_error_when_adding_context_then_message_names_step() {
        let r: DomainResult<()> = Err(DomainError::OutsideDomain(2.0));
        let err = r.with_step_context("evaluate map", "x=2").unwrap_err();
        assert_eq!(err.to_string(), "operation failed: evaluate map: x=2");
        let source = std::error::Error::source(&err).expect("source kept");
        assert_eq!(source.to_string(), "x=2 is not in any branch domain");
    }
}
