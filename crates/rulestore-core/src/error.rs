use thiserror::Error;

/// Core error types for rule handling
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid rule field index: {0} (expected 0..=5)")]
    InvalidFieldIndex(usize),

    #[error("Rule has {count} values, at most 6 are supported")]
    TooManyValues { count: usize },

    #[error("Invalid rule document: {message}")]
    InvalidDocument { message: String },
}

impl CoreError {
    /// Create a new InvalidFieldIndex error
    pub fn invalid_field_index(index: usize) -> Self {
        Self::InvalidFieldIndex(index)
    }

    /// Create a new TooManyValues error
    pub fn too_many_values(count: usize) -> Self {
        Self::TooManyValues { count }
    }

    /// Create a new InvalidDocument error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CoreError::invalid_field_index(7).to_string(),
            "Invalid rule field index: 7 (expected 0..=5)"
        );
        assert_eq!(
            CoreError::too_many_values(8).to_string(),
            "Rule has 8 values, at most 6 are supported"
        );
        assert_eq!(
            CoreError::invalid_document("ptype is not a string").to_string(),
            "Invalid rule document: ptype is not a string"
        );
    }
}
