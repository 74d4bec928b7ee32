//! Error handling for casematrix.
//!
//! Every failure the scenario core can raise is a variant of [`MatrixError`].
//! The errors are plain values (`Clone + PartialEq`) so a host runner can
//! either fail the invocation or assert on the error.

use std::fmt;
use thiserror::Error;

/// Error category for casematrix errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The matrix itself is malformed (columns, rows, isolation calls).
    Configuration,
    /// No scenario group is registered for a method.
    Lookup,
    /// A scenario value could not be bound to a parameter.
    Resolution,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Resolution => write!(f, "resolution"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("No scenarios found for method {method}")]
    ScenarioGroupNotFound { method: String },

    #[error("scenario row has {actual} values but the matrix declares {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("cannot {operation} a scenario group with no scenarios")]
    EmptyGroup { operation: &'static str },

    #[error("no parameter found at index {index}: expected {expected}, got {actual}")]
    ParameterResolution {
        expected: String,
        actual: String,
        index: usize,
    },

    #[error("template {template:?} needs a scenario label but none could be derived")]
    NameSubstitution { template: String },

    #[error("invalid scenario matrix: {0}")]
    Configuration(String),
}

impl MatrixError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatrixError::ScenarioGroupNotFound { .. } => ErrorCategory::Lookup,
            MatrixError::ParameterResolution { .. } => ErrorCategory::Resolution,
            MatrixError::ArityMismatch { .. }
            | MatrixError::EmptyGroup { .. }
            | MatrixError::NameSubstitution { .. }
            | MatrixError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    pub fn is_lookup_error(&self) -> bool {
        self.category() == ErrorCategory::Lookup
    }

    pub fn is_resolution_error(&self) -> bool {
        self.category() == ErrorCategory::Resolution
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

/// Result type alias for casematrix errors
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Convenience function to create configuration errors
pub fn configuration_error(message: impl Into<String>) -> MatrixError {
    MatrixError::Configuration(message.into())
}

/// Convenience function to create the not-found error for a method
pub fn not_found(method: impl Into<String>) -> MatrixError {
    MatrixError::ScenarioGroupNotFound {
        method: method.into(),
    }
}

/// Convenience function to create resolution errors
pub fn resolution_error(
    expected: impl Into<String>,
    actual: impl Into<String>,
    index: usize,
) -> MatrixError {
    MatrixError::ParameterResolution {
        expected: expected.into(),
        actual: actual.into(),
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Configuration), "configuration");
        assert_eq!(format!("{}", ErrorCategory::Lookup), "lookup");
        assert_eq!(format!("{}", ErrorCategory::Resolution), "resolution");
    }

    #[test]
    fn test_categories() {
        assert!(not_found("sum").is_lookup_error());
        assert!(resolution_error("Int", "Str", 0).is_resolution_error());
        assert!(configuration_error("dup").is_configuration_error());
        assert!(
            MatrixError::ArityMismatch {
                expected: 3,
                actual: 2
            }
            .is_configuration_error()
        );
        assert_eq!(
            MatrixError::EmptyGroup {
                operation: "isolate"
            }
            .category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_not_found_display() {
        insta::assert_snapshot!(not_found("sum").to_string(), @"No scenarios found for method sum");
    }

    #[test]
    fn test_resolution_display() {
        let err = resolution_error("Int", "Str", 1);
        insta::assert_snapshot!(err.to_string(), @"no parameter found at index 1: expected Int, got Str");
    }

    #[test]
    fn test_arity_display() {
        let err = MatrixError::ArityMismatch {
            expected: 3,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "scenario row has 4 values but the matrix declares 3 columns"
        );
    }

    #[test]
    fn test_empty_group_display() {
        let err = MatrixError::EmptyGroup { operation: "ignore" };
        assert_eq!(
            err.to_string(),
            "cannot ignore a scenario group with no scenarios"
        );
    }

    #[test]
    fn test_anyhow_conversion() {
        fn fails() -> anyhow::Result<()> {
            Err(not_found("missing"))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        let inner = err.downcast_ref::<MatrixError>().unwrap();
        assert!(inner.is_lookup_error());
    }
}
