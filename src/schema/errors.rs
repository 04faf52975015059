//! Schema authoring and loading errors
//!
//! Error codes:
//! - ANNO_SCHEMA_DUPLICATE_FEATURE
//! - ANNO_SCHEMA_DUPLICATE_LABEL
//! - ANNO_SCHEMA_INVALID_FEATURE
//! - ANNO_SCHEMA_PARSE
//! - ANNO_SCHEMA_NOT_FOUND

use std::fmt;
use std::io;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Two feature specs share a name within one schema
    DuplicateFeature,
    /// A schema for the label is already registered
    DuplicateSchema,
    /// A feature spec breaks the use/value/options rules
    InvalidFeatureSpec,
    /// External schema description is malformed
    SchemaParseError,
    /// Schema resource could not be located
    SchemaNotFound,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::DuplicateFeature => "ANNO_SCHEMA_DUPLICATE_FEATURE",
            SchemaErrorCode::DuplicateSchema => "ANNO_SCHEMA_DUPLICATE_LABEL",
            SchemaErrorCode::InvalidFeatureSpec => "ANNO_SCHEMA_INVALID_FEATURE",
            SchemaErrorCode::SchemaParseError => "ANNO_SCHEMA_PARSE",
            SchemaErrorCode::SchemaNotFound => "ANNO_SCHEMA_NOT_FOUND",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    label: Option<String>,
    source: Option<io::Error>,
}

impl SchemaError {
    /// Two specs named `feature` inside the schema for `label`
    pub fn duplicate_feature(label: impl Into<String>, feature: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            code: SchemaErrorCode::DuplicateFeature,
            message: format!(
                "Feature '{}' defined more than once in schema '{}'",
                feature.into(),
                label
            ),
            label: Some(label),
            source: None,
        }
    }

    /// A schema for `label` already exists; registered schemas are immutable
    pub fn duplicate_schema(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            code: SchemaErrorCode::DuplicateSchema,
            message: format!("Schema '{}' is already registered", label),
            label: Some(label),
            source: None,
        }
    }

    /// Feature spec `feature` in schema `label` is inconsistent
    pub fn invalid_feature(
        label: impl Into<String>,
        feature: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let label = label.into();
        Self {
            code: SchemaErrorCode::InvalidFeatureSpec,
            message: format!(
                "Feature '{}' in schema '{}': {}",
                feature.into(),
                label,
                reason.into()
            ),
            label: Some(label),
            source: None,
        }
    }

    /// Malformed schema description read from `origin`
    pub fn parse_error(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaParseError,
            message: format!(
                "Malformed schema '{}': {}",
                origin.into(),
                reason.into()
            ),
            label: None,
            source: None,
        }
    }

    /// Resource `origin` could not be read
    pub fn not_found(origin: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaNotFound,
            message: format!("Schema resource '{}' not found", origin.into()),
            label: None,
            source,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Label of the schema involved, if known
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
