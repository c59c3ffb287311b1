//! Error types for query preprocessing and evaluation.

use thiserror::Error;

/// Fatal query errors. Any of these aborts the whole query run.
///
/// A field that is missing on one record is not an error; comparisons
/// absorb it into their default result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Operator seen with an unsupported number of operands
    #[error("Operator {operator} has {actual} operands")]
    WrongArgumentCount { operator: String, actual: usize },

    /// Operands cannot be brought to a common type
    #[error("{message}")]
    IncompatibleType { message: String },

    /// A wildcard or regular expression pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A node reached evaluation that the evaluator cannot handle
    #[error("Query execution error: {message}")]
    ExecParseError { message: String },
}

impl QueryError {
    pub fn wrong_argument_count(operator: impl Into<String>, actual: usize) -> Self {
        QueryError::WrongArgumentCount {
            operator: operator.into(),
            actual,
        }
    }

    /// Two operands with no promotion rule between them
    pub fn incomparable(left: &str, right: &str, operator: &str) -> Self {
        QueryError::IncompatibleType {
            message: format!(
                "Unable to compare: {} with: {} using operator: {}",
                left, right, operator
            ),
        }
    }

    /// A literal that cannot be converted to the type a comparison needs
    pub fn unconvertible_value(text: &str, target: &str) -> Self {
        QueryError::IncompatibleType {
            message: format!("Unable to convert value: {} to {} value", text, target),
        }
    }

    /// A field used in logical context without a boolean value
    pub fn unconvertible_field(field: &str) -> Self {
        QueryError::IncompatibleType {
            message: format!("Unable to convert field: {} to boolean value", field),
        }
    }

    pub fn exec(message: impl Into<String>) -> Self {
        QueryError::ExecParseError {
            message: message.into(),
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::wrong_argument_count("BETWEEN", 2);
        assert_eq!(err.to_string(), "Operator BETWEEN has 2 operands");

        let err = QueryError::incomparable("true", "\"abc\"", "=");
        assert_eq!(
            err.to_string(),
            "Unable to compare: true with: \"abc\" using operator: ="
        );

        let err = QueryError::unconvertible_field("active");
        assert_eq!(
            err.to_string(),
            "Unable to convert field: active to boolean value"
        );
        assert!(matches!(err, QueryError::IncompatibleType { .. }));

        let err = QueryError::exec("query tree has no root");
        assert_eq!(
            err.to_string(),
            "Query execution error: query tree has no root"
        );
    }
}
