//! Store error types
//!
//! Error codes:
//! - ANNO_STORE_NOT_OPEN
//! - ANNO_STORE_NOT_FOUND
//! - ANNO_STORE_CORRUPT
//! - ANNO_STORE_IO
//! - ANNO_STORE_ENCODE

use std::fmt;
use std::io;
use std::path::Path;

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Operation on an unopened or closed store
    StoreNotOpen,
    /// No valid manifest at the path
    NotFound,
    /// Manifest or payloads missing, unparsable or failing their checksum
    CorruptStore,
    /// Filesystem failure while writing or reading
    Io,
    /// In-memory value could not be serialized
    Encode,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::StoreNotOpen => "ANNO_STORE_NOT_OPEN",
            StoreErrorCode::NotFound => "ANNO_STORE_NOT_FOUND",
            StoreErrorCode::CorruptStore => "ANNO_STORE_CORRUPT",
            StoreErrorCode::Io => "ANNO_STORE_IO",
            StoreErrorCode::Encode => "ANNO_STORE_ENCODE",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error type with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Operation attempted while the store is not open
    pub fn not_open(operation: &str, state: impl fmt::Display) -> Self {
        Self::new(
            StoreErrorCode::StoreNotOpen,
            format!("Cannot {} a store in state {}", operation, state),
        )
    }

    /// No manifest at `path`
    pub fn not_found(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("No store manifest at {}", path.display()),
        )
    }

    /// Store content at `path` cannot be trusted
    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        Self::new(
            StoreErrorCode::CorruptStore,
            format!("Corrupt store content at {}", path.display()),
        )
        .with_details(reason)
    }

    /// Filesystem failure
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StoreErrorCode::Io, message)
        }
    }

    /// Filesystem failure at `path`
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at path: {}", path.display()), source)
    }

    /// Serialization failure
    pub fn encode_error(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            StoreErrorCode::Encode,
            format!("Failed to encode {}", what.into()),
        )
        .with_details(reason)
    }

    /// Add details to an error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
