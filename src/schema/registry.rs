//! In-memory schema registry
//!
//! The registry is an explicit object owned by the caller. Schemas are
//! kept in registration order and are immutable once registered.

use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use super::loader::{load_schema, SchemaLocator};
use super::types::{AnnotationSchema, FeatureSpec};
use crate::observability::{log_event_with_fields, Event};

/// Registry of annotation schemas keyed by label
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<AnnotationSchema>,
    by_label: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding `schemas`, in order.
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = AnnotationSchema>,
    ) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Defines and registers a schema from feature specs.
    ///
    /// # Errors
    ///
    /// - `DuplicateFeature` if two specs share a name
    /// - `InvalidFeatureSpec` if a spec breaks the feature rules
    /// - `DuplicateSchema` if `label` is already registered
    pub fn define_schema(
        &mut self,
        label: impl Into<String>,
        feature_specs: impl IntoIterator<Item = FeatureSpec>,
    ) -> SchemaResult<&AnnotationSchema> {
        let schema = AnnotationSchema::from_specs(label, feature_specs)?;
        self.register(schema)
    }

    /// Loads a schema description from a file or bundled resource and
    /// registers it.
    ///
    /// # Errors
    ///
    /// - `SchemaNotFound` if the resource cannot be read
    /// - `SchemaParseError` if the description is malformed
    /// - `DuplicateSchema` if the label is already registered
    pub fn load_schema_from_resource(
        &mut self,
        locator: &SchemaLocator,
    ) -> SchemaResult<&AnnotationSchema> {
        let schema = load_schema(locator)?;
        log_event_with_fields(
            Event::SchemaLoaded,
            &[("label", &schema.label), ("resource", &locator.to_string())],
        );
        self.register(schema)
    }

    /// Registers a fully formed schema after re-checking it.
    pub fn register(&mut self, schema: AnnotationSchema) -> SchemaResult<&AnnotationSchema> {
        schema.check()?;

        if self.by_label.contains_key(&schema.label) {
            return Err(SchemaError::duplicate_schema(&schema.label));
        }

        log_event_with_fields(
            Event::SchemaRegistered,
            &[
                ("features", &schema.features.len().to_string()),
                ("label", &schema.label),
            ],
        );

        let idx = self.schemas.len();
        self.by_label.insert(schema.label.clone(), idx);
        self.schemas.push(schema);
        Ok(&self.schemas[idx])
    }

    pub fn get(&self, label: &str) -> Option<&AnnotationSchema> {
        self.by_label.get(label).map(|&idx| &self.schemas[idx])
    }

    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    /// Registered schemas in registration order
    pub fn schemas(&self) -> &[AnnotationSchema] {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
