//! Error types for the grouping and filtering engine.

use std::path::PathBuf;

/// Result type alias for tree grid operations.
pub type Result<T> = std::result::Result<T, TreeGridError>;

/// Errors that can occur while grouping, matching, or persisting view state.
#[derive(Debug, thiserror::Error)]
pub enum TreeGridError {
    /// A rule or query named a column that is not in the schema.
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    /// A condition name could not be parsed.
    #[error("Unknown match condition '{condition}'")]
    UnknownCondition { condition: String },

    /// A wildcard or regular expression keyword failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Grouping was requested on a column that cannot be grouped.
    #[error("Column '{column}' cannot be used for grouping")]
    InvalidGroupColumn { column: String },

    /// A row id is not present in the store.
    #[error("Unknown row id {id}")]
    UnknownRow { id: u64 },

    /// A structural transition broke one of the projection's invariants.
    #[error("Projection invariant violated: {message}")]
    InvariantViolation { message: String },

    /// File I/O error while saving or loading view state.
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// View state could not be encoded or decoded.
    #[error("{format} serialization error: {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },
}

impl TreeGridError {
    /// Create an unknown column error.
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    /// Create an unknown condition error.
    pub fn unknown_condition(condition: impl Into<String>) -> Self {
        Self::UnknownCondition {
            condition: condition.into(),
        }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create an invalid group column error.
    pub fn invalid_group_column(column: impl Into<String>) -> Self {
        Self::InvalidGroupColumn {
            column: column.into(),
        }
    }

    /// Create an unknown row error.
    pub fn unknown_row(id: u64) -> Self {
        Self::UnknownRow { id }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serialization(format: &'static str, message: impl ToString) -> Self {
        Self::Serialization {
            format,
            message: message.to_string(),
        }
    }

    /// Returns `true` for errors caused by user input rather than program state.
    ///
    /// The presentation layer shows these as a transient status message and
    /// keeps its previous visible and highlight state.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownColumn { .. }
                | Self::UnknownCondition { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidGroupColumn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TreeGridError::unknown_column("Age");
        assert_eq!(err.to_string(), "Unknown column 'Age'");

        let err = TreeGridError::invalid_group_column("ID");
        assert_eq!(err.to_string(), "Column 'ID' cannot be used for grouping");

        let err = TreeGridError::serialization("JSON", "expected value");
        assert_eq!(err.to_string(), "JSON serialization error: expected value");
    }

    #[test]
    fn test_user_input_classification() {
        let bad_regex = regex::Regex::new("(").unwrap_err();
        assert!(TreeGridError::invalid_pattern("(", bad_regex).is_user_input());
        assert!(TreeGridError::unknown_condition("fuzzy").is_user_input());
        assert!(!TreeGridError::unknown_row(7).is_user_input());
        assert!(!TreeGridError::invariant_violation("row count changed").is_user_input());
    }
}
