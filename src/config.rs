//! Configuration file
//!
//! ```json
//! {
//!   "corpus_name": "news-2026",
//!   "sync": true,
//!   "log_level": "info",
//!   "schemas": ["Person", "schemas/event.json"]
//! }
//! ```
//!
//! Every field is optional. Relative schema paths are resolved against the
//! directory holding the configuration file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};
use crate::schema::{SchemaLocator, SchemaRegistry};
use crate::store::{RebuildOptions, DEFAULT_CORPUS_NAME};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All of them are fatal to the command being run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "ANNO_CONFIG_READ",
            ConfigError::Parse { .. } => "ANNO_CONFIG_PARSE",
            ConfigError::Invalid(_) => "ANNO_CONFIG_INVALID",
        }
    }
}

/// Configuration driving the command-line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Corpus name recorded by `build` (default "default-corpus")
    #[serde(default = "default_corpus_name")]
    pub corpus_name: String,

    /// fsync payloads and manifest (default true)
    #[serde(default = "default_sync")]
    pub sync: bool,

    /// Minimum log severity: trace, info, warn or error (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Schema locators: file paths or bundled schema names
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Directory relative schema paths are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_corpus_name() -> String {
    DEFAULT_CORPUS_NAME.to_string()
}
fn default_sync() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_name: default_corpus_name(),
            sync: default_sync(),
            log_level: default_log_level(),
            schemas: Vec::new(),
            base_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("corpus", &config.corpus_name),
                ("path", &path.display().to_string()),
            ],
        );

        Ok(config)
    }

    /// Checks field values that serde cannot.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.corpus_name.trim().is_empty() {
            return Err(ConfigError::Invalid("corpus_name must not be blank".into()));
        }

        Severity::from_str(&self.log_level).map_err(ConfigError::Invalid)?;

        if let Some(blank) = self.schemas.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "schemas[{}] must not be blank",
                blank
            )));
        }

        Ok(())
    }

    /// Minimum log severity. Falls back to INFO for an unvalidated config.
    pub fn severity(&self) -> Severity {
        Severity::from_str(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Schema locators with relative paths resolved.
    pub fn schema_locators(&self) -> Vec<SchemaLocator> {
        self.schemas
            .iter()
            .map(|raw| match SchemaLocator::from(raw.as_str()) {
                SchemaLocator::Path(path) => match &self.base_dir {
                    Some(base) if path.is_relative() => SchemaLocator::Path(base.join(path)),
                    _ => SchemaLocator::Path(path),
                },
                bundled => bundled,
            })
            .collect()
    }

    /// Rebuild options carrying this configuration and the schemas of
    /// `registry`.
    pub fn rebuild_options(&self, registry: &SchemaRegistry) -> RebuildOptions {
        RebuildOptions::default()
            .with_corpus_name(self.corpus_name.clone())
            .with_sync(self.sync)
            .with_registry(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_object() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("annostore.json");
        fs::write(&path, "{}").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.corpus_name, "default-corpus");
        assert!(config.sync);
        assert_eq!(config.severity(), Severity::Info);
        assert!(config.schemas.is_empty());
    }

    #[test]
    fn test_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("annostore.json");
        fs::write(
            &path,
            r#"{"corpus_name": "news", "sync": false, "log_level": "warn",
                "schemas": ["Person", "local/event.json"]}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.corpus_name, "news");
        assert!(!config.sync);
        assert_eq!(config.severity(), Severity::Warn);

        let locators = config.schema_locators();
        assert_eq!(locators[0], SchemaLocator::bundled("Person"));
        assert_eq!(
            locators[1],
            SchemaLocator::path(tmp.path().join("local/event.json"))
        );
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let config = Config {
            log_level: "chatty".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_blank_corpus_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("annostore.json");
        fs::write(&path, r#"{"corpus_name": "  "}"#).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.code(), "ANNO_CONFIG_INVALID");
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("annostore.json");
        fs::write(&path, r#"{"data_dir": "/tmp"}"#).unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "ANNO_CONFIG_READ");
    }

    #[test]
    fn test_rebuild_options() {
        let config = Config {
            corpus_name: "c".into(),
            sync: false,
            ..Config::default()
        };
        let options = config.rebuild_options(&SchemaRegistry::new());
        assert_eq!(options.corpus_name, "c");
        assert!(!options.sync);
        assert!(options.schemas.is_empty());
    }
}
