//! Custom error types for Tally
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. `EvaluationError` covers everything that can
//! go wrong while turning a transaction expression into a number; `TallyError`
//! wraps it together with storage, configuration and validation failures.

use thiserror::Error;

/// Errors raised while evaluating expressions and resolving references
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The expression contains characters outside the arithmetic grammar
    #[error("Unsafe characters in expression: {0}")]
    UnsafeExpression(String),

    /// An identifier that is not a known constant
    #[error("Undefined symbol {0}")]
    UndefinedSymbol(String),

    /// Malformed arithmetic (dangling operator, unbalanced parentheses, ...)
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The expression produced no number, or a non-finite one
    #[error("Expression result is not a number: {0}")]
    NonNumericResult(String),

    /// Context wrapper added by the arithmetic evaluator
    #[error("Cannot evaluate expression \"{expression}\": {reason}")]
    Expression {
        expression: String,
        reason: Box<EvaluationError>,
    },

    /// A `$id` token that does not resolve to a transaction of the owner
    #[error("Transaction reference not found: {0}")]
    ReferenceNotFound(String),

    /// A reference chain that loops back on itself
    #[error("Circular reference detected: {}", .path.join(" -> "))]
    CircularReference { path: Vec<String> },

    /// A transaction whose expression names its own identifier
    #[error("Transaction cannot reference itself: {0}")]
    SelfReference(String),

    /// A reference chain deeper than the configured limit
    #[error("Maximum reference depth of {max_depth} exceeded while resolving {id}")]
    MaxDepthExceeded { id: String, max_depth: usize },

    /// Unknown frequency token
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// The transaction lookup collaborator failed
    #[error("Transaction lookup failed: {0}")]
    Lookup(String),

    /// Context wrapper added once at the transaction evaluator boundary
    #[error("Cannot evaluate transaction expression: {reason}")]
    Transaction {
        expression: String,
        reason: Box<EvaluationError>,
    },
}

impl EvaluationError {
    /// Wrap an arithmetic failure with the expression it came from
    pub fn in_expression(expression: impl Into<String>, reason: EvaluationError) -> Self {
        Self::Expression {
            expression: expression.into(),
            reason: Box::new(reason),
        }
    }

    /// Wrap any failure at the transaction evaluator boundary
    ///
    /// Already wrapped errors are returned unchanged so the message is only
    /// prefixed once.
    pub fn in_transaction(expression: impl Into<String>, reason: EvaluationError) -> Self {
        if matches!(reason, Self::Transaction { .. }) {
            return reason;
        }
        Self::Transaction {
            expression: expression.into(),
            reason: Box::new(reason),
        }
    }

    /// The underlying failure, with the context wrappers stripped
    pub fn root_cause(&self) -> &EvaluationError {
        match self {
            Self::Expression { reason, .. } | Self::Transaction { reason, .. } => {
                reason.root_cause()
            }
            other => other,
        }
    }

    /// Check if the root cause is a non-finite or missing result
    pub fn is_non_numeric(&self) -> bool {
        matches!(self.root_cause(), Self::NonNumericResult(_))
    }

    /// Check if the root cause is a reference cycle
    pub fn is_circular(&self) -> bool {
        matches!(self.root_cause(), Self::CircularReference { .. })
    }
}

/// The main error type for Tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Expression evaluation errors
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TallyError {
    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The evaluation error behind this error, if any
    pub fn as_evaluation(&self) -> Option<&EvaluationError> {
        match self {
            Self::Evaluation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Tally operations
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TallyError::transaction_not_found("txn-1234");
        assert_eq!(err.to_string(), "Transaction not found: txn-1234");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_circular_reference_display() {
        let err = EvaluationError::CircularReference {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular reference detected: A -> B -> A");
    }

    #[test]
    fn test_expression_wrapper_display() {
        let err = EvaluationError::in_expression(
            "2 + @",
            EvaluationError::UnsafeExpression("2 + @".into()),
        );
        assert_eq!(
            err.to_string(),
            "Cannot evaluate expression \"2 + @\": Unsafe characters in expression: 2 + @"
        );
    }

    #[test]
    fn test_transaction_wrapper_is_applied_once() {
        let inner = EvaluationError::ReferenceNotFound("tx-9".into());
        let once = EvaluationError::in_transaction("$tx-9", inner);
        let twice = EvaluationError::in_transaction("$tx-9", once.clone());

        assert_eq!(once, twice);
        assert_eq!(
            twice.to_string(),
            "Cannot evaluate transaction expression: Transaction reference not found: tx-9"
        );
    }

    #[test]
    fn test_root_cause_strips_wrappers() {
        let err = EvaluationError::in_transaction(
            "1/0",
            EvaluationError::in_expression("1/0", EvaluationError::NonNumericResult("1/0".into())),
        );
        assert!(err.is_non_numeric());
        assert!(!err.is_circular());
    }

    #[test]
    fn test_from_evaluation_error() {
        let err: TallyError = EvaluationError::InvalidFrequency("hourly".into()).into();
        assert_eq!(err.to_string(), "Invalid frequency: hourly");
        assert!(err.as_evaluation().is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let tally_err: TallyError = io_err.into();
        assert!(matches!(tally_err, TallyError::Io(_)));
    }
}
