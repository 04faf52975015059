//! Loading schema descriptions from files and bundled resources
//!
//! A locator is either a filesystem path or the name of a schema compiled
//! into the crate (`Person`, `Location`, `Organization`, `Date`).
//! Descriptions are JSON documents of the shape shown in `types`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use super::errors::{SchemaError, SchemaResult};
use super::types::{AnnotationSchema, FeatureSpec};

const BUNDLED: &[(&str, &str)] = &[
    ("Person", include_str!("../../resources/schemas/person.json")),
    ("Location", include_str!("../../resources/schemas/location.json")),
    ("Organization", include_str!("../../resources/schemas/organization.json")),
    ("Date", include_str!("../../resources/schemas/date.json")),
];

/// Where a schema description lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocator {
    /// JSON file on disk
    Path(PathBuf),
    /// Schema compiled into the crate, by name
    Bundled(String),
}

impl SchemaLocator {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SchemaLocator::Path(path.into())
    }

    pub fn bundled(name: impl Into<String>) -> Self {
        SchemaLocator::Bundled(name.into())
    }

    /// Names of the bundled schemas
    pub fn bundled_names() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }

    /// Reads the raw description text.
    fn read(&self) -> SchemaResult<String> {
        match self {
            SchemaLocator::Path(path) => fs::read_to_string(path)
                .map_err(|e| SchemaError::not_found(path.display().to_string(), Some(e))),
            SchemaLocator::Bundled(name) => BUNDLED
                .iter()
                .find(|(bundled, _)| bundled.eq_ignore_ascii_case(name))
                .map(|(_, text)| text.to_string())
                .ok_or_else(|| SchemaError::not_found(format!("bundled:{}", name), None)),
        }
    }
}

impl fmt::Display for SchemaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaLocator::Path(path) => write!(f, "{}", path.display()),
            SchemaLocator::Bundled(name) => write!(f, "bundled:{}", name),
        }
    }
}

/// `bundled:<name>` or a bare bundled name selects a bundled schema;
/// anything else is treated as a path.
impl From<&str> for SchemaLocator {
    fn from(s: &str) -> Self {
        if let Some(name) = s.strip_prefix("bundled:") {
            return SchemaLocator::bundled(name);
        }
        if Self::bundled_names().any(|name| name.eq_ignore_ascii_case(s)) {
            return SchemaLocator::bundled(s);
        }
        SchemaLocator::path(s)
    }
}

impl FromStr for SchemaLocator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&Path> for SchemaLocator {
    fn from(path: &Path) -> Self {
        SchemaLocator::Path(path.to_path_buf())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDescription {
    label: String,
    #[serde(default)]
    features: Vec<FeatureSpec>,
}

/// Parses a JSON schema description.
///
/// # Errors
///
/// - `SchemaParseError` if the text is not a valid description
/// - `DuplicateFeature` / `InvalidFeatureSpec` if the features are inconsistent
pub fn parse_schema(origin: &str, text: &str) -> SchemaResult<AnnotationSchema> {
    let description: SchemaDescription = serde_json::from_str(text)
        .map_err(|e| SchemaError::parse_error(origin, e.to_string()))?;
    AnnotationSchema::from_specs(description.label, description.features)
}

/// Reads and parses the description a locator points to.
pub fn load_schema(locator: &SchemaLocator) -> SchemaResult<AnnotationSchema> {
    let text = locator.read()?;
    parse_schema(&locator.to_string(), &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FeatureUse, SchemaErrorCode};
    use tempfile::TempDir;

    #[test]
    fn test_all_bundled_schemas_parse() {
        for name in SchemaLocator::bundled_names() {
            let schema = load_schema(&SchemaLocator::bundled(name)).unwrap();
            assert_eq!(schema.label, name);
            assert!(!schema.features.is_empty());
        }
    }

    #[test]
    fn test_bundled_lookup_is_case_insensitive() {
        let schema = load_schema(&SchemaLocator::bundled("date")).unwrap();
        assert_eq!(schema.label, "Date");
        assert_eq!(schema.feature("kind").unwrap().usage, FeatureUse::Fixed);
    }

    #[test]
    fn test_unknown_bundled_name() {
        let err = load_schema(&SchemaLocator::bundled("Vehicle")).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SchemaNotFound);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("animal.json");
        fs::write(
            &path,
            r#"{"label":"ANIMAL","features":[{"name":"species"},{"name":"legs","value":"4","use":"default"}]}"#,
        )
        .unwrap();

        let schema = load_schema(&SchemaLocator::path(&path)).unwrap();
        assert_eq!(schema.label, "ANIMAL");
        assert_eq!(schema.feature_names().collect::<Vec<_>>(), vec!["species", "legs"]);
        assert_eq!(schema.feature("legs").unwrap().value.as_deref(), Some("4"));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_schema(&SchemaLocator::path(tmp.path().join("nope.json"))).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SchemaNotFound);
    }

    #[test]
    fn test_malformed_description() {
        for text in [
            "not json",
            r#"{"features":[]}"#,
            r#"{"label":"X","features":[{"name":"a","use":"sometimes"}]}"#,
            r#"{"label":"X","extra":true}"#,
        ] {
            let err = parse_schema("inline", text).unwrap_err();
            assert_eq!(err.code(), SchemaErrorCode::SchemaParseError, "input: {}", text);
        }
    }

    #[test]
    fn test_duplicate_feature_in_description() {
        let err = parse_schema(
            "inline",
            r#"{"label":"X","features":[{"name":"a"},{"name":"a"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::DuplicateFeature);
    }

    #[test]
    fn test_locator_from_str() {
        assert_eq!(
            "bundled:Person".parse::<SchemaLocator>().unwrap(),
            SchemaLocator::bundled("Person")
        );
        assert_eq!(
            "location".parse::<SchemaLocator>().unwrap(),
            SchemaLocator::bundled("location")
        );
        assert_eq!(
            "schemas/animal.json".parse::<SchemaLocator>().unwrap(),
            SchemaLocator::path("schemas/animal.json")
        );
    }
}
