//! Store manifest structure and serialization
//!
//! `manifest.json` is the authoritative corpus index. It is written last
//! during a rebuild, so a directory without one is never readable as a
//! store.
//!
//! Format:
//! ```json
//! {
//!   "format_version": 1,
//!   "corpus_name": "corpus1",
//!   "created_at": "2026-10-18T09:30:00Z",
//!   "documents": [
//!     { "id": "doc-000000", "name": "doc1", "file": "documents/000000.json",
//!       "checksum": "crc32:deadbeef" }
//!   ],
//!   "schemas": [
//!     { "id": "schema-000000", "name": "PERSON", "file": "schemas/000000.json",
//!       "checksum": "crc32:abcd1234" }
//!   ]
//! }
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Manifest file name inside the store directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Directory holding document payloads
pub const DOCUMENTS_DIR: &str = "documents";

/// Directory holding schema payloads
pub const SCHEMAS_DIR: &str = "schemas";

/// Only manifest version this crate reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// One payload file listed in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadEntry {
    /// Store-local identifier, stable for the life of the store
    pub id: String,
    /// Document name or schema label, for inspection without decoding
    pub name: String,
    /// Path relative to the store directory
    pub file: String,
    /// CRC32 of the payload bytes (`crc32:xxxxxxxx`)
    pub checksum: String,
}

impl PayloadEntry {
    /// Entry for the document at position `index`
    pub fn document(index: usize, name: &str, checksum: String) -> Self {
        Self {
            id: format!("doc-{:06}", index),
            name: name.to_string(),
            file: format!("{}/{:06}.json", DOCUMENTS_DIR, index),
            checksum,
        }
    }

    /// Entry for the schema at position `index`
    pub fn schema(index: usize, label: &str, checksum: String) -> Self {
        Self {
            id: format!("schema-{:06}", index),
            name: label.to_string(),
            file: format!("{}/{:06}.json", SCHEMAS_DIR, index),
            checksum,
        }
    }

    /// Resolves the payload path, refusing anything outside `store_dir`.
    pub fn resolve(&self, store_dir: &Path) -> StoreResult<PathBuf> {
        let relative = Path::new(&self.file);
        let contained = !self.file.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !contained {
            return Err(StoreError::corrupt(
                store_dir,
                format!("entry {} points outside the store: '{}'", self.id, self.file),
            ));
        }
        Ok(store_dir.join(relative))
    }
}

/// Store manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreManifest {
    pub format_version: u32,
    pub corpus_name: String,
    /// Creation timestamp in RFC3339 format (YYYY-MM-DDTHH:MM:SSZ)
    pub created_at: String,
    /// Documents in insertion order
    pub documents: Vec<PayloadEntry>,
    /// Schemas in insertion order
    #[serde(default)]
    pub schemas: Vec<PayloadEntry>,
}

impl StoreManifest {
    /// Creates an empty manifest stamped with the current time.
    pub fn new(corpus_name: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            corpus_name: corpus_name.into(),
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            documents: Vec::new(),
            schemas: Vec::new(),
        }
    }

    /// Serializes the manifest to pretty-printed JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::encode_error("manifest", e.to_string()))
    }

    /// Parses a manifest, checking the format version.
    ///
    /// `store_dir` is only used for error context.
    pub fn from_json(store_dir: &Path, json: &str) -> StoreResult<Self> {
        let manifest: StoreManifest = serde_json::from_str(json).map_err(|e| {
            StoreError::corrupt(store_dir, format!("unparsable manifest: {}", e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::corrupt(
                store_dir,
                format!(
                    "unsupported manifest format version {} (expected {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            ));
        }

        Ok(manifest)
    }

    /// Atomically writes the manifest into `store_dir`.
    ///
    /// The JSON goes to a temporary file which is fsynced (when `sync`)
    /// and renamed over `manifest.json`, so readers see either the old
    /// manifest or the new one, never a torn write.
    pub fn write_to_dir(&self, store_dir: &Path, sync: bool) -> StoreResult<()> {
        let json = self.to_json()?;
        let path = store_dir.join(MANIFEST_FILE);
        let tmp_path = store_dir.join(format!("{}.tmp", MANIFEST_FILE));

        let write_result = (|| -> io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            if sync {
                file.sync_all()?;
            }
            Ok(())
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io_error(
                format!("Failed to write manifest: {}", tmp_path.display()),
                e,
            ));
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::io_error(
                format!("Failed to install manifest: {}", path.display()),
                e,
            )
        })
    }

    /// Reads the manifest from `store_dir`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no manifest file
    /// - `CorruptStore` if it cannot be parsed
    pub fn read_from_dir(store_dir: &Path) -> StoreResult<Self> {
        if !store_dir.is_dir() {
            return Err(StoreError::not_found(store_dir));
        }

        let path = store_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::not_found(store_dir),
            io::ErrorKind::InvalidData => {
                StoreError::corrupt(store_dir, "manifest is not valid UTF-8")
            }
            _ => StoreError::io_error_at_path(&path, e),
        })?;

        Self::from_json(store_dir, &content)
    }
}
