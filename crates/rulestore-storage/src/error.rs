//! Storage error types for the rule collection abstraction layer.
//!
//! Backend driver errors are not translated: they are carried as the
//! `source` of [`StorageError::Backend`] and can be downcast by callers.

use std::fmt;

use rulestore_core::CoreError;

/// Boxed backend error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during rule collection operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend driver reported an error.
    #[error("Backend error: {source}")]
    Backend {
        /// The driver error, unmodified.
        #[source]
        source: BoxError,
    },

    /// Failed to connect to the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// The query uses a construct the backend cannot evaluate.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Description of the offending construct.
        message: String,
    },

    /// A rule or position supplied by the caller cannot be stored.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },

    /// A stored document could not be decoded as a rule.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },
}

impl StorageError {
    /// Wraps a backend driver error.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            source: Box::new(err),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Returns `true` if this wraps a backend driver error.
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns `true` if this is an invalid query error.
    #[must_use]
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery { .. })
    }

    /// Returns `true` if caller input was rejected.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Returns `true` if this is an invalid document error.
    #[must_use]
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, Self::InvalidDocument { .. })
    }

    /// Returns the wrapped backend error, if any.
    #[must_use]
    pub fn backend_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Backend { source } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::InvalidQuery { .. } | Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::InvalidDocument { .. } => ErrorCategory::Data,
        }
    }
}

impl From<CoreError> for StorageError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDocument { .. } => Self::invalid_document(err.to_string()),
            CoreError::InvalidFieldIndex(_) | CoreError::TooManyValues { .. } => {
                Self::invalid_input(err.to_string())
            }
        }
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Driver-reported error.
    Backend,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Query or input validation error.
    Validation,
    /// Malformed stored data.
    Data,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => write!(f, "backend"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Validation => write!(f, "validation"),
            Self::Data => write!(f, "data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("socket closed")]
    struct DriverError;

    #[test]
    fn test_error_display() {
        let err = StorageError::invalid_query("unsupported operator $where");
        assert_eq!(err.to_string(), "Invalid query: unsupported operator $where");

        let err = StorageError::backend(DriverError);
        assert_eq!(err.to_string(), "Backend error: socket closed");
    }

    #[test]
    fn test_backend_source_is_preserved() {
        let err = StorageError::backend(DriverError);
        assert!(err.is_backend());
        let source = err.backend_source().unwrap();
        assert!(source.downcast_ref::<DriverError>().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_core_error() {
        let err = StorageError::from(CoreError::invalid_document("ptype must be a string"));
        assert!(err.is_invalid_document());
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_from_core_error_caller_input() {
        let err = StorageError::from(CoreError::too_many_values(7));
        assert!(err.is_invalid_input());
        assert!(!err.is_invalid_document());
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = StorageError::from(CoreError::InvalidFieldIndex(6));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::connection_error("refused").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(StorageError::invalid_query("bad").category(), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::Backend.to_string(), "backend");
    }
}
