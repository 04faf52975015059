//! CLI command implementations
//!
//! Commands are thin: they load configuration, call into `schema` and
//! `store`, and print JSON lines. Logs go to stderr, data to stdout.

use std::path::Path;

use serde_json::json;

use crate::config::Config;
use crate::document::Document;
use crate::observability::Logger;
use crate::schema::{SchemaLocator, SchemaRegistry};
use crate::store;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{document_json, read_documents, violation_json, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Build {
            input,
            store,
            config,
            schemas,
        } => build(&input, &store, config.as_deref(), &schemas),
        Command::Dump { store, config } => dump(&store, config.as_deref()),
        Command::Validate { store, config } => validate(&store, config.as_deref()),
        Command::Info { store, config } => info(&store, config.as_deref()),
    }
}

/// Loads the configuration (defaults when no file is given) and applies
/// its log level.
fn load_config(config_path: Option<&Path>) -> CliResult<Config> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Logger::set_min_severity(config.severity());
    Ok(config)
}

/// Registers configured schemas, then those given on the command line.
fn load_registry(config: &Config, extra: &[String]) -> CliResult<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    let locators = config
        .schema_locators()
        .into_iter()
        .chain(extra.iter().map(|raw| SchemaLocator::from(raw.as_str())));

    for locator in locators {
        registry.load_schema_from_resource(&locator)?;
    }
    Ok(registry)
}

/// Prints every violation of `documents` and returns how many there were.
fn report_violations<'a>(
    registry: &SchemaRegistry,
    documents: impl IntoIterator<Item = &'a Document>,
) -> CliResult<usize> {
    let mut total = 0;
    for document in documents {
        for violation in registry.validate(document) {
            write_response(&violation_json(document, &violation))?;
            total += 1;
        }
    }
    Ok(total)
}

/// Build a store from an input file
///
/// Documents are validated against the configured schemas first; the
/// store is only rebuilt when there are no violations.
pub fn build(
    input: &Path,
    store_path: &Path,
    config_path: Option<&Path>,
    schemas: &[String],
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config, schemas)?;
    let documents = read_documents(input)?;

    let violations = report_violations(&registry, &documents)?;
    if violations > 0 {
        return Err(CliError::validation_failed(violations));
    }

    let mut store = store::rebuild(store_path, &documents, &config.rebuild_options(&registry))?;

    write_response(&json!({
        "store": store.path().display().to_string(),
        "corpus_name": store.corpus_name()?,
        "documents": store.len()?,
        "schemas": store.schemas()?.len(),
    }))?;

    store.close();
    Ok(())
}

/// Print every stored document as one JSON line
pub fn dump(store_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    load_config(config_path)?;
    let mut store = store::open(store_path)?;

    for document in store.documents()? {
        write_response(&document_json(&document?))?;
    }

    store.close();
    Ok(())
}

/// Validate stored documents against stored schemas
///
/// Fails when any violation is found.
pub fn validate(store_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    load_config(config_path)?;
    let mut store = store::open(store_path)?;

    let mut total = 0;
    for document in store.documents()? {
        let document = document?;
        total += report_violations(store.schema_registry()?, [&document])?;
    }

    store.close();
    if total > 0 {
        return Err(CliError::validation_failed(total));
    }
    Ok(())
}

/// Print store summary
pub fn info(store_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    load_config(config_path)?;
    let mut store = store::open(store_path)?;
    let manifest = store.manifest()?;

    let schemas: Vec<_> = store
        .schemas()?
        .iter()
        .map(|schema| {
            json!({
                "label": schema.label,
                "features": schema.feature_names().collect::<Vec<_>>(),
            })
        })
        .collect();

    write_response(&json!({
        "store": store.path().display().to_string(),
        "corpus_name": manifest.corpus_name,
        "format_version": manifest.format_version,
        "created_at": manifest.created_at,
        "documents": manifest.documents.len(),
        "schemas": schemas,
    }))?;

    store.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorCode;
    use std::fs;
    use tempfile::TempDir;

    const INPUT: &str = r#"[
        {"name": "doc1", "text": "Alice met Bob.",
         "annotations": [
            {"start": 0, "end": 5, "label": "Person", "features": {"gender": "female"}},
            {"start": 10, "end": 13, "label": "Person"}
         ]},
        {"name": "doc2", "text": "Nothing to see."}
    ]"#;

    fn write_input(tmp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join("docs.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_build_then_open() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(&tmp, INPUT);
        let store_path = tmp.path().join("corpus");

        build(&input, &store_path, None, &["Person".to_string()]).unwrap();

        let store = store::open(&store_path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.schemas().unwrap()[0].label, "Person");

        dump(&store_path, None).unwrap();
        validate(&store_path, None).unwrap();
        info(&store_path, None).unwrap();
    }

    #[test]
    fn test_build_refuses_invalid_documents() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(
            &tmp,
            r#"[{"text": "Alice", "annotations": [
                {"start": 0, "end": 5, "label": "Person", "features": {"height": 170}}
            ]}]"#,
        );
        let store_path = tmp.path().join("corpus");

        let err = build(&input, &store_path, None, &["Person".to_string()]).unwrap_err();
        assert_eq!(err.code_str(), "ANNO_CLI_VALIDATION_FAILED");
        assert!(!store_path.exists());
    }

    #[test]
    fn test_unknown_bundled_schema() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(&tmp, INPUT);
        let err = build(
            &input,
            &tmp.path().join("corpus"),
            None,
            &["bundled:Weather".to_string()],
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "ANNO_CLI_SCHEMA_ERROR");
    }

    #[test]
    fn test_dump_missing_store() {
        let tmp = TempDir::new().unwrap();
        let err = dump(&tmp.path().join("absent"), None).unwrap_err();
        assert_eq!(err.code_str(), "ANNO_CLI_STORE_ERROR");
        assert!(err.message().contains(StoreErrorCode::NotFound.code()));
    }
}
