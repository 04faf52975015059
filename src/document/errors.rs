//! Document authoring errors

use thiserror::Error;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised while building documents and attaching annotations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Malformed construction arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Annotation span inverted, empty or past the end of the content
    #[error("Span [{start}, {end}) out of range for content of {len} characters")]
    RangeError {
        start: usize,
        end: usize,
        len: usize,
    },
}

impl DocumentError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::InvalidInput(_) => "ANNO_INVALID_INPUT",
            DocumentError::RangeError { .. } => "ANNO_RANGE_ERROR",
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        DocumentError::InvalidInput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(DocumentError::invalid_input("x").code(), "ANNO_INVALID_INPUT");
        let err = DocumentError::RangeError { start: 5, end: 3, len: 12 };
        assert_eq!(err.code(), "ANNO_RANGE_ERROR");
        assert!(err.to_string().contains("[5, 3)"));
    }
}
