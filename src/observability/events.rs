//! Observable store and schema events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Schemas
    /// Schema registered in a registry
    SchemaRegistered,
    /// Schema parsed from an external resource
    SchemaLoaded,
    /// Validation reported violations
    ValidationViolations,

    // Rebuild
    /// Existing store directory removed before rebuild
    RebuildDelete,
    /// Document payload written
    DocumentWritten,
    /// Schema payload written
    SchemaWritten,
    /// Manifest written, store is readable
    ManifestWritten,
    /// Partial tree removed after a failed rebuild
    RebuildCleanup,

    // Read path
    /// Store opened
    StoreOpened,
    /// Store open refused (missing or corrupt)
    StoreOpenRejected,
    /// Payload failed to decode during iteration
    PayloadCorrupt,
    /// Document appended to an open store
    DocumentAppended,
    /// Orphaned payload removed after a failed append
    AppendCleanup,
    /// Store closed
    StoreClosed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::ValidationViolations => "VALIDATION_VIOLATIONS",

            Event::RebuildDelete => "REBUILD_DELETE_EXISTING",
            Event::DocumentWritten => "DOCUMENT_WRITTEN",
            Event::SchemaWritten => "SCHEMA_WRITTEN",
            Event::ManifestWritten => "MANIFEST_WRITTEN",
            Event::RebuildCleanup => "REBUILD_CLEANUP",

            Event::StoreOpened => "STORE_OPENED",
            Event::StoreOpenRejected => "STORE_OPEN_REJECTED",
            Event::PayloadCorrupt => "PAYLOAD_CORRUPT",
            Event::DocumentAppended => "DOCUMENT_APPENDED",
            Event::AppendCleanup => "APPEND_CLEANUP",
            Event::StoreClosed => "STORE_CLOSED",
        }
    }

    /// Default severity for the event
    pub fn severity(&self) -> super::Severity {
        use super::Severity;
        match self {
            Event::DocumentWritten | Event::SchemaWritten => Severity::Trace,
            Event::RebuildDelete | Event::ValidationViolations => Severity::Warn,
            Event::RebuildCleanup
            | Event::AppendCleanup
            | Event::StoreOpenRejected
            | Event::PayloadCorrupt => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
