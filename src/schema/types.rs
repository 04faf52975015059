//! Annotation schema definitions
//!
//! An `AnnotationSchema` names a label and the features an annotation with
//! that label may carry. Each `FeatureSchema` has:
//! - `value`: the default (or, for `fixed`, the only) value
//! - `use`: `default`, `fixed` or `none`
//! - `options`: optional closed set of permitted values
//!
//! On-disk and resource format (JSON):
//!
//! ```json
//! {
//!   "label": "PERSON",
//!   "features": [
//!     { "name": "kind", "value": "human", "use": "fixed" },
//!     { "name": "gender", "options": ["male", "female", "unknown"] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// How a feature's schema value is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureUse {
    /// `value` is a default the author may override
    #[default]
    Default,
    /// `value` is the only accepted value
    Fixed,
    /// No default applies
    None,
}

impl FeatureUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureUse::Default => "default",
            FeatureUse::Fixed => "fixed",
            FeatureUse::None => "none",
        }
    }
}

impl fmt::Display for FeatureUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Author-facing feature definition; `use` falls back to `default`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub usage: Option<FeatureUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn usage(mut self, usage: FeatureUse) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Shorthand for a `fixed` feature
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name).value(value).usage(FeatureUse::Fixed)
    }
}

/// Resolved feature definition held by a registered schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "use", default)]
    pub usage: FeatureUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FeatureSchema {
    /// Resolves a spec, checking the use/value/options rules.
    pub fn from_spec(label: &str, spec: FeatureSpec) -> SchemaResult<Self> {
        let feature = Self {
            name: spec.name,
            value: spec.value,
            usage: spec.usage.unwrap_or_default(),
            options: spec.options,
        };
        feature.check(label)?;
        Ok(feature)
    }

    /// Checks the feature invariants for the schema named `label`.
    pub fn check(&self, label: &str) -> SchemaResult<()> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::invalid_feature(label, &self.name, "name must not be blank"));
        }

        if let Some(options) = &self.options {
            let mut seen = HashSet::new();
            if let Some(dup) = options.iter().find(|o| !seen.insert(o.as_str())) {
                return Err(SchemaError::invalid_feature(
                    label,
                    &self.name,
                    format!("option '{}' listed twice", dup),
                ));
            }
        }

        match (self.usage, &self.value) {
            (FeatureUse::Fixed, None) => Err(SchemaError::invalid_feature(
                label,
                &self.name,
                "fixed use requires a value",
            )),
            (FeatureUse::Fixed | FeatureUse::Default, Some(value)) if !self.allows(value) => {
                Err(SchemaError::invalid_feature(
                    label,
                    &self.name,
                    format!("value '{}' is not among the options", value),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Whether `value` is permitted by the options, if any
    pub fn allows(&self, value: &str) -> bool {
        self.options
            .as_ref()
            .map_or(true, |options| options.iter().any(|o| o == value))
    }

    /// The value a fixed feature must carry
    pub fn fixed_value(&self) -> Option<&str> {
        match self.usage {
            FeatureUse::Fixed => self.value.as_deref(),
            _ => None,
        }
    }
}

/// Label plus its permitted features, unique by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSchema {
    pub label: String,
    #[serde(default)]
    pub features: Vec<FeatureSchema>,
}

impl AnnotationSchema {
    /// Builds a schema from author specs.
    ///
    /// # Errors
    ///
    /// - `DuplicateFeature` if two specs share a name
    /// - `InvalidFeatureSpec` if a spec breaks the feature rules
    pub fn from_specs(
        label: impl Into<String>,
        specs: impl IntoIterator<Item = FeatureSpec>,
    ) -> SchemaResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(SchemaError::invalid_feature(&label, "", "schema label must not be blank"));
        }

        let mut features: Vec<FeatureSchema> = Vec::new();
        for spec in specs {
            if features.iter().any(|f| f.name == spec.name) {
                return Err(SchemaError::duplicate_feature(&label, &spec.name));
            }
            features.push(FeatureSchema::from_spec(&label, spec)?);
        }

        Ok(Self { label, features })
    }

    /// Re-checks a schema that arrived fully formed (decoded from disk).
    pub fn check(&self) -> SchemaResult<()> {
        if self.label.trim().is_empty() {
            return Err(SchemaError::invalid_feature(&self.label, "", "schema label must not be blank"));
        }
        let mut names = HashSet::new();
        for feature in &self.features {
            if !names.insert(feature.name.as_str()) {
                return Err(SchemaError::duplicate_feature(&self.label, &feature.name));
            }
            feature.check(&self.label)?;
        }
        Ok(())
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSchema> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;

    #[test]
    fn test_default_use_is_default() {
        let schema =
            AnnotationSchema::from_specs("PERSON", [FeatureSpec::new("gender").value("male")]).unwrap();
        assert_eq!(schema.features[0].usage, FeatureUse::Default);
    }

    #[test]
    fn test_duplicate_feature_rejected() {
        let err = AnnotationSchema::from_specs(
            "PERSON",
            [FeatureSpec::new("kind"), FeatureSpec::new("kind").value("x")],
        )
        .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::DuplicateFeature);
    }

    #[test]
    fn test_fixed_requires_value() {
        let err = AnnotationSchema::from_specs(
            "PERSON",
            [FeatureSpec::new("kind").usage(FeatureUse::Fixed)],
        )
        .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::InvalidFeatureSpec);
    }

    #[test]
    fn test_fixed_value_must_be_an_option() {
        let err = AnnotationSchema::from_specs(
            "PERSON",
            [FeatureSpec::fixed("kind", "robot").options(["human", "animal"])],
        )
        .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::InvalidFeatureSpec);

        let ok = AnnotationSchema::from_specs(
            "PERSON",
            [FeatureSpec::fixed("kind", "human").options(["human", "animal"])],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let err = AnnotationSchema::from_specs(
            "DATE",
            [FeatureSpec::new("kind").options(["date", "date"])],
        )
        .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::InvalidFeatureSpec);
    }

    #[test]
    fn test_json_shape() {
        let schema = AnnotationSchema::from_specs(
            "PERSON",
            [
                FeatureSpec::fixed("kind", "human"),
                FeatureSpec::new("gender").options(["male", "female"]),
            ],
        )
        .unwrap();

        let json: serde_json::Value = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["label"], "PERSON");
        assert_eq!(json["features"][0]["use"], "fixed");
        assert_eq!(json["features"][0]["value"], "human");
        assert_eq!(json["features"][1]["use"], "default");
        assert!(json["features"][1].get("value").is_none());
        assert_eq!(json["features"][1]["options"][1], "female");
    }

    #[test]
    fn test_check_catches_decoded_duplicates() {
        let feature = FeatureSchema {
            name: "kind".into(),
            value: None,
            usage: FeatureUse::None,
            options: None,
        };
        let schema = AnnotationSchema {
            label: "X".into(),
            features: vec![feature.clone(), feature],
        };
        assert_eq!(schema.check().unwrap_err().code(), SchemaErrorCode::DuplicateFeature);
    }
}
