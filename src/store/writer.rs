//! Store rebuild and append
//!
//! Rebuild follows this exact sequence:
//!
//! 1. Delete `<path>` recursively if it exists (logged at WARN)
//! 2. Create `<path>/documents` and `<path>/schemas`
//! 3. Write every document payload in the order given
//! 4. Write every schema payload
//! 5. fsync both payload directories
//! 6. Write `manifest.json` (temp file, fsync, rename)
//! 7. fsync the store directory
//!
//! Any failure after step 1 removes the partial tree, so a path is either
//! a complete store or absent. fsync steps are skipped when `sync` is off.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::checksum::{compute_checksum, format_checksum};
use super::codec::{encode_document, encode_schema};
use super::errors::{StoreError, StoreResult};
use super::manifest::{PayloadEntry, StoreManifest, DOCUMENTS_DIR, SCHEMAS_DIR};
use crate::document::Document;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::schema::AnnotationSchema;

/// fsync a directory so renames and new entries are durable.
fn fsync_dir(path: &Path) -> StoreResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| StoreError::io_error_at_path(path, e))?;

    dir.sync_all().map_err(|e| {
        StoreError::io_error(format!("fsync directory failed: {}", path.display()), e)
    })
}

fn create_dir(path: &Path) -> StoreResult<()> {
    fs::create_dir_all(path).map_err(|e| {
        StoreError::io_error(format!("Failed to create directory: {}", path.display()), e)
    })
}

/// Writes one payload and returns its formatted checksum.
fn write_payload(path: &Path, bytes: &[u8], sync: bool) -> StoreResult<String> {
    let mut file = File::create(path).map_err(|e| {
        StoreError::io_error(format!("Failed to create payload: {}", path.display()), e)
    })?;

    file.write_all(bytes).map_err(|e| {
        StoreError::io_error(format!("Failed to write payload: {}", path.display()), e)
    })?;

    if sync {
        file.sync_all().map_err(|e| {
            StoreError::io_error(format!("fsync failed for: {}", path.display()), e)
        })?;
    }

    Ok(format_checksum(compute_checksum(bytes)))
}

/// Removes whatever is at `path`, directory or file.
fn remove_existing(path: &Path) -> StoreResult<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| {
        StoreError::io_error(format!("Failed to delete existing store: {}", path.display()), e)
    })
}

/// Remove a partial store tree (cleanup on failure).
fn cleanup_partial(path: &Path, reason: &str) {
    if path.exists() {
        // Best effort: we are already on an error path
        let _ = fs::remove_dir_all(path);
    }
    log_event_with_fields(
        Event::RebuildCleanup,
        &[("path", &path.display().to_string()), ("reason", reason)],
    );
}

/// Remove a payload the manifest never came to reference.
fn cleanup_orphan(payload_path: &Path, reason: &str) {
    let removed = match fs::remove_file(payload_path) {
        Ok(()) => "true".to_string(),
        Err(e) => format!("false: {}", e),
    };
    log_event_with_fields(
        Event::AppendCleanup,
        &[
            ("path", &payload_path.display().to_string()),
            ("reason", reason),
            ("removed", &removed),
        ],
    );
}

/// Destructively rebuilds the store at `path`.
///
/// Returns the manifest that was installed.
pub(crate) fn rebuild_tree<'a>(
    path: &Path,
    corpus_name: &str,
    documents: impl IntoIterator<Item = &'a Document>,
    schemas: &[AnnotationSchema],
    sync: bool,
) -> StoreResult<StoreManifest> {
    let path_str = path.display().to_string();
    let scope = ObservationScope::with_fields("REBUILD", &[("path", &path_str)]);

    if path.exists() {
        log_event_with_fields(Event::RebuildDelete, &[("path", &path_str)]);
        if let Err(e) = remove_existing(path) {
            scope.fail(&e.to_string());
            return Err(e);
        }
    }

    let result = write_tree(path, corpus_name, documents, schemas, sync);

    match result {
        Ok(manifest) => {
            let documents = manifest.documents.len().to_string();
            let schemas = manifest.schemas.len().to_string();
            scope.complete_with_fields(&[("documents", &documents), ("schemas", &schemas)]);
            Ok(manifest)
        }
        Err(e) => {
            let reason = e.to_string();
            cleanup_partial(path, &reason);
            scope.fail(&reason);
            Err(e)
        }
    }
}

fn write_tree<'a>(
    path: &Path,
    corpus_name: &str,
    documents: impl IntoIterator<Item = &'a Document>,
    schemas: &[AnnotationSchema],
    sync: bool,
) -> StoreResult<StoreManifest> {
    let documents_dir = path.join(DOCUMENTS_DIR);
    let schemas_dir = path.join(SCHEMAS_DIR);
    create_dir(&documents_dir)?;
    create_dir(&schemas_dir)?;

    let mut manifest = StoreManifest::new(corpus_name);

    for (index, document) in documents.into_iter().enumerate() {
        let bytes = encode_document(document)?;
        let mut entry = PayloadEntry::document(index, document.name(), String::new());
        entry.checksum = write_payload(&entry.resolve(path)?, &bytes, sync)?;
        log_event_with_fields(
            Event::DocumentWritten,
            &[("id", &entry.id), ("name", &entry.name)],
        );
        manifest.documents.push(entry);
    }

    for (index, schema) in schemas.iter().enumerate() {
        let bytes = encode_schema(schema)?;
        let mut entry = PayloadEntry::schema(index, &schema.label, String::new());
        entry.checksum = write_payload(&entry.resolve(path)?, &bytes, sync)?;
        log_event_with_fields(
            Event::SchemaWritten,
            &[("id", &entry.id), ("label", &entry.name)],
        );
        manifest.schemas.push(entry);
    }

    if sync {
        fsync_dir(&documents_dir)?;
        fsync_dir(&schemas_dir)?;
    }

    manifest.write_to_dir(path, sync)?;
    if sync {
        fsync_dir(path)?;
    }

    let count = manifest.documents.len().to_string();
    log_event_with_fields(
        Event::ManifestWritten,
        &[("path", &path.display().to_string()), ("documents", &count)],
    );

    Ok(manifest)
}

/// Appends `document` to the store described by `manifest`.
///
/// The payload is written first, then a new manifest including it is
/// installed atomically. Returns the new manifest; `manifest` itself is
/// left untouched so the caller keeps a consistent view on failure.
pub(crate) fn append_document(
    path: &Path,
    manifest: &StoreManifest,
    document: &Document,
    sync: bool,
) -> StoreResult<StoreManifest> {
    let bytes = encode_document(document)?;
    let index = manifest.documents.len();
    let mut entry = PayloadEntry::document(index, document.name(), String::new());
    let payload_path = entry.resolve(path)?;

    entry.checksum = write_payload(&payload_path, &bytes, sync)?;

    let mut updated = manifest.clone();
    updated.documents.push(entry);

    let installed = (|| -> StoreResult<()> {
        if sync {
            fsync_dir(&path.join(DOCUMENTS_DIR))?;
        }
        updated.write_to_dir(path, sync)
    })();

    if let Err(e) = installed {
        // The old manifest is still in place; drop the orphaned payload
        cleanup_orphan(&payload_path, &e.to_string());
        return Err(e);
    }

    Ok(updated)
}
