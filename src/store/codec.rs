//! Payload encoding for documents and schemas
//!
//! Document payload (`documents/NNNNNN.json`):
//! ```json
//! {
//!   "name": "doc1",
//!   "content": "The cat sat.",
//!   "features": { "source": "test" },
//!   "annotations": [
//!     { "id": 0, "label": "ANIMAL", "start": 4, "end": 7,
//!       "features": { "species": "cat" } }
//!   ]
//! }
//! ```
//!
//! Schema payloads (`schemas/NNNNNN.json`) use the same JSON shape as
//! schema resource files. Decoding re-checks every invariant the in-memory
//! types enforce; a payload that violates one is reported as corrupt.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use crate::document::{Annotation, Document, FeatureMap, Ordinal};
use crate::schema::AnnotationSchema;

#[derive(Serialize)]
struct DocumentRecordRef<'a> {
    name: &'a str,
    content: &'a str,
    features: &'a FeatureMap,
    annotations: Vec<AnnotationRecordRef<'a>>,
}

#[derive(Serialize)]
struct AnnotationRecordRef<'a> {
    id: Ordinal,
    label: &'a str,
    start: usize,
    end: usize,
    features: &'a FeatureMap,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentRecord {
    name: String,
    content: String,
    #[serde(default)]
    features: FeatureMap,
    #[serde(default)]
    annotations: Vec<AnnotationRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AnnotationRecord {
    id: Ordinal,
    label: String,
    start: usize,
    end: usize,
    #[serde(default)]
    features: FeatureMap,
}

/// Checks that every feature of `document` can be stored.
///
/// JSON has no NaN or infinity; serde_json would write them as `null`,
/// which no longer decodes as a feature value.
pub fn check_document(document: &Document) -> StoreResult<()> {
    let encode_error = |key: &str, owner: String| {
        StoreError::encode_error(
            format!("document '{}'", document.name()),
            format!("feature '{}' of {} is not a finite number", key, owner),
        )
    };

    if let Some(key) = document.features().first_non_finite() {
        return Err(encode_error(key, "the document".to_string()));
    }
    for annotation in document.annotations_in_order() {
        if let Some(key) = annotation.features().first_non_finite() {
            return Err(encode_error(key, format!("annotation {}", annotation.ordinal())));
        }
    }
    Ok(())
}

/// Encodes a document with its annotations in ordinal order.
pub fn encode_document(document: &Document) -> StoreResult<Vec<u8>> {
    check_document(document)?;

    let record = DocumentRecordRef {
        name: document.name(),
        content: document.content(),
        features: document.features(),
        annotations: document
            .annotations_in_order()
            .iter()
            .map(|a| AnnotationRecordRef {
                id: a.ordinal(),
                label: a.label(),
                start: a.start(),
                end: a.end(),
                features: a.features(),
            })
            .collect(),
    };

    serde_json::to_vec(&record).map_err(|e| {
        StoreError::encode_error(format!("document '{}'", document.name()), e.to_string())
    })
}

/// Decodes a document payload read from `path`.
pub fn decode_document(path: &Path, bytes: &[u8]) -> StoreResult<Document> {
    let record: DocumentRecord = serde_json::from_slice(bytes)
        .map_err(|e| StoreError::corrupt(path, format!("unparsable document payload: {}", e)))?;

    let annotations = record
        .annotations
        .into_iter()
        .map(|a| Annotation::new(a.id, a.label, a.start, a.end, a.features))
        .collect();

    Document::from_parts(record.name, record.content, record.features, annotations)
        .map_err(|e| StoreError::corrupt(path, format!("invalid document payload: {}", e)))
}

/// Encodes a schema.
pub fn encode_schema(schema: &AnnotationSchema) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(schema).map_err(|e| {
        StoreError::encode_error(format!("schema '{}'", schema.label), e.to_string())
    })
}

/// Decodes a schema payload read from `path`.
pub fn decode_schema(path: &Path, bytes: &[u8]) -> StoreResult<AnnotationSchema> {
    let schema: AnnotationSchema = serde_json::from_slice(bytes)
        .map_err(|e| StoreError::corrupt(path, format!("unparsable schema payload: {}", e)))?;

    schema
        .check()
        .map_err(|e| StoreError::corrupt(path, format!("invalid schema payload: {}", e)))?;

    Ok(schema)
}
