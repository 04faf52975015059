//! Documents, annotations and feature maps
//!
//! # Model
//!
//! - A `Document` owns immutable text, a name, document-level features and
//!   an ordered list of `Annotation`s.
//! - An `Annotation` is a labeled half-open character span `[start, end)`
//!   with its own `FeatureMap`.
//! - Annotations are addressed by ordinal through an `AnnotationHandle`;
//!   nothing outside the document holds a reference into it.
//! - Zero-width spans are rejected.

mod annotation;
#[allow(clippy::module_inception)]
mod document;
mod errors;
mod features;

pub use annotation::{Annotation, AnnotationHandle, Ordinal};
pub use document::{Document, DocumentBuilder};
pub use errors::{DocumentError, DocumentResult};
pub use features::{FeatureMap, FeatureValue};
