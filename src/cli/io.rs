//! JSON I/O handling for the CLI
//!
//! - Input: one JSON array of documents read from a file
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::document::{Document, FeatureMap};
use crate::schema::Violation;

/// One document of the `build` input file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDocument {
    #[serde(default)]
    pub name: Option<String>,
    /// Required; kept optional here so a missing text is reported as
    /// invalid input rather than a JSON error
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub features: FeatureMap,
    #[serde(default)]
    pub annotations: Vec<InputAnnotation>,
}

/// One annotation of an input document
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputAnnotation {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(default)]
    pub features: FeatureMap,
}

impl InputDocument {
    /// Builds the document and attaches its annotations in input order.
    pub fn into_document(self) -> crate::Result<Document> {
        let mut builder = Document::builder().features(self.features);
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(text) = self.text {
            builder = builder.text(text);
        }

        let mut document = builder.build()?;
        for annotation in self.annotations {
            document.annotate(
                annotation.start,
                annotation.end,
                annotation.label,
                annotation.features,
            )?;
        }
        Ok(document)
    }
}

/// Reads and converts the documents of a `build` input file.
pub fn read_documents(path: &Path) -> CliResult<Vec<Document>> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read input {}: {}", path.display(), e))
    })?;

    let inputs: Vec<InputDocument> = serde_json::from_str(&content).map_err(|e| {
        CliError::input_error(format!("Invalid input JSON in {}: {}", path.display(), e))
    })?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input.into_document().map_err(|e| {
                CliError::from(e).with_context(format!("input document #{}", index))
            })
        })
        .collect()
}

/// JSON form of a stored document, with the covered text of every span.
pub fn document_json(document: &Document) -> Value {
    let annotations: Vec<Value> = document
        .annotations_in_order()
        .iter()
        .map(|a| {
            json!({
                "id": a.ordinal(),
                "label": a.label(),
                "start": a.start(),
                "end": a.end(),
                "text": document.span_text(a),
                "features": a.features(),
            })
        })
        .collect();

    json!({
        "name": document.name(),
        "content": document.content(),
        "features": document.features(),
        "annotations": annotations,
    })
}

/// JSON form of a validation finding.
pub fn violation_json(document: &Document, violation: &Violation) -> Value {
    json!({
        "document": document.name(),
        "id": violation.ordinal,
        "label": violation.label,
        "feature": violation.feature,
        "kind": violation.kind.as_str(),
        "expected": violation.expected,
        "actual": violation.actual,
    })
}

/// Write one JSON value as a line to `out`
pub fn write_json_line(out: &mut impl Write, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write one JSON value as a line to stdout
pub fn write_response(value: &Value) -> CliResult<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_json_line(&mut lock, value)?;
    lock.flush()?;
    Ok(())
}
