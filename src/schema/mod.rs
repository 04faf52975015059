//! Annotation schemas
//!
//! Schemas are optional metadata: they describe which features an
//! annotation with a given label may carry and are used to validate
//! documents while authoring. Nothing forces an annotation to have a
//! registered schema.
//!
//! # Design Principles
//!
//! - Explicit registry object, no global state
//! - Registered schemas are immutable
//! - Validation reports violations, it never rewrites annotations
//! - Deterministic: same document, same violations, same order

mod errors;
mod loader;
mod registry;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::{load_schema, parse_schema, SchemaLocator};
pub use registry::SchemaRegistry;
pub use types::{AnnotationSchema, FeatureSchema, FeatureSpec, FeatureUse};
pub use validator::{SchemaValidator, Violation, ViolationKind};
