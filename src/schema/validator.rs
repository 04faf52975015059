//! Annotation validation against registered schemas
//!
//! Validation semantics:
//! - Only annotations whose label has a registered schema are checked;
//!   other labels pass through
//! - Every feature key must be declared by the schema
//! - A `fixed` feature, when present, must equal the schema value
//! - A feature with options must hold one of them
//!
//! Values are compared by their text form, so `4` satisfies option `"4"`.
//! Validation never mutates the document and reports every violation
//! rather than stopping at the first.

use std::fmt;

use super::registry::SchemaRegistry;
use crate::document::{Annotation, Document, Ordinal};
use crate::observability::{log_event_with_fields, Event};

/// What rule an annotation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Feature key not declared by the schema
    UndeclaredFeature,
    /// Fixed feature carries a different value
    FixedValueMismatch,
    /// Value outside the feature's options
    DisallowedValue,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::UndeclaredFeature => "undeclared_feature",
            ViolationKind::FixedValueMismatch => "fixed_value_mismatch",
            ViolationKind::DisallowedValue => "disallowed_value",
        }
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Ordinal of the offending annotation
    pub ordinal: Ordinal,
    pub label: String,
    pub feature: String,
    pub kind: ViolationKind,
    /// Expected value or condition
    pub expected: String,
    /// Value found
    pub actual: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "annotation #{} ({}) feature '{}': {}: expected {}, got {}",
            self.ordinal,
            self.label,
            self.feature,
            self.kind.as_str(),
            self.expected,
            self.actual
        )
    }
}

/// Validator bound to a registry
pub struct SchemaValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates every annotation of `document`, in annotation order.
    pub fn validate_document(&self, document: &Document) -> Vec<Violation> {
        let violations: Vec<Violation> = document
            .annotations_in_order()
            .iter()
            .flat_map(|annotation| self.validate_annotation(annotation))
            .collect();

        if !violations.is_empty() {
            log_event_with_fields(
                Event::ValidationViolations,
                &[
                    ("document", document.name()),
                    ("violations", &violations.len().to_string()),
                ],
            );
        }

        violations
    }

    /// Validates one annotation; unregistered labels yield nothing.
    pub fn validate_annotation(&self, annotation: &Annotation) -> Vec<Violation> {
        let Some(schema) = self.registry.get(annotation.label()) else {
            return Vec::new();
        };

        let mut violations = Vec::new();
        let violation = |feature: &str, kind, expected: String, actual: String| Violation {
            ordinal: annotation.ordinal(),
            label: annotation.label().to_string(),
            feature: feature.to_string(),
            kind,
            expected,
            actual,
        };

        for (key, value) in annotation.features().iter() {
            let Some(feature) = schema.feature(key) else {
                violations.push(violation(
                    key,
                    ViolationKind::UndeclaredFeature,
                    format!("one of [{}]", schema.feature_names().collect::<Vec<_>>().join(", ")),
                    key.to_string(),
                ));
                continue;
            };

            let text = value.to_string();

            if let Some(fixed) = feature.fixed_value() {
                if text != fixed {
                    violations.push(violation(
                        key,
                        ViolationKind::FixedValueMismatch,
                        format!("'{}'", fixed),
                        format!("'{}'", text),
                    ));
                    continue;
                }
            }

            if !feature.allows(&text) {
                let options = feature.options.as_deref().unwrap_or_default();
                violations.push(violation(
                    key,
                    ViolationKind::DisallowedValue,
                    format!("one of [{}]", options.join(", ")),
                    format!("'{}'", text),
                ));
            }
        }

        violations
    }
}

impl SchemaRegistry {
    /// Validates `document` against the registered schemas.
    pub fn validate(&self, document: &Document) -> Vec<Violation> {
        SchemaValidator::new(self).validate_document(document)
    }
}
