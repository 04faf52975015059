//! Directory-backed annotation store
//!
//! A store holds one named corpus of documents plus the annotation schemas
//! that go with it.
//!
//! # Design Principles
//!
//! - Destructive rebuild: the target path is replaced, never merged
//! - Atomic visibility: the manifest is written last, via rename
//! - Integrity verified at open, documents decoded lazily
//! - Explicit lifecycle: `Unopened -> Open -> Closed`
//!
//! # Layout
//!
//! ```text
//! <path>/
//!   manifest.json
//!   documents/000000.json
//!   schemas/000000.json
//! ```
//!
//! # Concurrency
//!
//! Single writer. Rebuild and append on one path must be serialized by the
//! caller. Reading only needs `&Store`, so any number of `DocumentIter`s
//! may be alive at once; `close` needs `&mut Store` and therefore waits
//! for all of them to be dropped.

mod checksum;
mod codec;
mod errors;
mod manifest;
mod reader;
mod writer;

pub use checksum::{compute_checksum, format_checksum, parse_checksum};
pub use codec::{check_document, decode_document, decode_schema, encode_document, encode_schema};
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use manifest::{
    PayloadEntry, StoreManifest, DOCUMENTS_DIR, FORMAT_VERSION, MANIFEST_FILE, SCHEMAS_DIR,
};
pub use reader::DocumentIter;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{AnnotationSchema, SchemaRegistry};

/// Corpus name used when none is given
pub const DEFAULT_CORPUS_NAME: &str = "default-corpus";

/// Lifecycle state of a [`Store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unopened,
    Open,
    Closed,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreState::Unopened => "UNOPENED",
            StoreState::Open => "OPEN",
            StoreState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for [`rebuild`]
#[derive(Debug, Clone)]
pub struct RebuildOptions {
    /// Name recorded in the manifest
    pub corpus_name: String,
    /// Schemas stored alongside the documents, in order
    pub schemas: Vec<AnnotationSchema>,
    /// fsync payloads, manifest and directories
    pub sync: bool,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            corpus_name: DEFAULT_CORPUS_NAME.to_string(),
            schemas: Vec::new(),
            sync: true,
        }
    }
}

impl RebuildOptions {
    pub fn with_corpus_name(mut self, corpus_name: impl Into<String>) -> Self {
        self.corpus_name = corpus_name.into();
        self
    }

    pub fn with_schemas(mut self, schemas: impl IntoIterator<Item = AnnotationSchema>) -> Self {
        self.schemas = schemas.into_iter().collect();
        self
    }

    /// Stores every schema of `registry`, in registration order.
    pub fn with_registry(self, registry: &SchemaRegistry) -> Self {
        self.with_schemas(registry.schemas().iter().cloned())
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// State held only while the store is open
#[derive(Debug)]
struct OpenContents {
    manifest: StoreManifest,
    registry: SchemaRegistry,
}

/// Handle to a store directory
///
/// ```ignore
/// let mut doc = Document::with_name("The cat sat.", "doc1");
/// doc.annotate(4, 7, "ANIMAL", FeatureMap::new())?;
///
/// store::rebuild("/tmp/corpus", [&doc], &RebuildOptions::default())?;
///
/// let store = store::open("/tmp/corpus")?;
/// for document in store.documents()? {
///     println!("{}", document?.name());
/// }
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    state: StoreState,
    sync: bool,
    contents: Option<OpenContents>,
}

impl Store {
    /// Creates an unopened handle for `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: StoreState::Unopened,
            sync: true,
            contents: None,
        }
    }

    /// Sets whether `append` fsyncs. Stores returned by [`rebuild`] inherit
    /// the rebuild option.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == StoreState::Open
    }

    /// Destructively rebuilds the store from `documents` and opens it.
    ///
    /// Documents and schemas are checked first; if they are refused the
    /// existing store is left alone. Otherwise whatever exists at the path
    /// is deleted, and a failure from then on leaves nothing at the path.
    /// An open handle is closed just before the old tree is deleted.
    ///
    /// # Errors
    ///
    /// - `Encode` if a document or schema cannot be serialized, or two
    ///   schemas share a label. Both are detected before the old tree is
    ///   touched.
    /// - `Io` on filesystem failure
    pub fn rebuild<'a>(
        &mut self,
        documents: impl IntoIterator<Item = &'a Document>,
        options: &RebuildOptions,
    ) -> StoreResult<()> {
        let registry = SchemaRegistry::from_schemas(options.schemas.iter().cloned())
            .map_err(|e| StoreError::encode_error("schemas", e.to_string()))?;

        let documents: Vec<&Document> = documents.into_iter().collect();
        for document in &documents {
            codec::check_document(document)?;
        }

        if self.state == StoreState::Open {
            self.close();
        }

        let manifest = writer::rebuild_tree(
            &self.path,
            &options.corpus_name,
            documents,
            registry.schemas(),
            options.sync,
        )?;

        self.sync = options.sync;
        self.install(manifest, registry);
        Ok(())
    }

    /// Opens the store at the handle's path.
    ///
    /// Every payload is checked against its manifest checksum and all
    /// schemas are decoded. Documents are decoded lazily by
    /// [`Store::documents`].
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no manifest at the path
    /// - `CorruptStore` if the manifest or any payload is damaged
    pub fn open(&mut self) -> StoreResult<()> {
        match load(&self.path) {
            Ok((manifest, registry)) => {
                self.install(manifest, registry);
                Ok(())
            }
            Err(e) => {
                log_event_with_fields(
                    Event::StoreOpenRejected,
                    &[
                        ("code", e.code().code()),
                        ("path", &self.path.display().to_string()),
                    ],
                );
                Err(e)
            }
        }
    }

    fn install(&mut self, manifest: StoreManifest, registry: SchemaRegistry) {
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("corpus", &manifest.corpus_name),
                ("documents", &manifest.documents.len().to_string()),
                ("path", &self.path.display().to_string()),
                ("schemas", &registry.len().to_string()),
            ],
        );
        self.contents = Some(OpenContents { manifest, registry });
        self.state = StoreState::Open;
    }

    /// Closes the store. Closing a closed store is a no-op.
    pub fn close(&mut self) {
        if self.state == StoreState::Open {
            log_event_with_fields(
                Event::StoreClosed,
                &[("path", &self.path.display().to_string())],
            );
        }
        self.contents = None;
        self.state = StoreState::Closed;
    }

    fn contents(&self, operation: &str) -> StoreResult<&OpenContents> {
        match (&self.contents, self.state) {
            (Some(contents), StoreState::Open) => Ok(contents),
            _ => Err(StoreError::not_open(operation, self.state)),
        }
    }

    /// Iterates the stored documents in the order they were written.
    ///
    /// The iterator is lazy; each item decodes one payload. Call again to
    /// start over.
    pub fn documents(&self) -> StoreResult<DocumentIter<'_>> {
        let contents = self.contents("read documents from")?;
        Ok(DocumentIter::new(&self.path, &contents.manifest.documents))
    }

    /// Reads the document at position `index`, if there is one.
    pub fn document(&self, index: usize) -> StoreResult<Option<Document>> {
        let contents = self.contents("read a document from")?;
        contents
            .manifest
            .documents
            .get(index)
            .map(|entry| reader::read_document(&self.path, entry))
            .transpose()
    }

    /// Appends `document` after the existing ones.
    ///
    /// The payload is written before the manifest is replaced, so a crash
    /// in between leaves the store as it was.
    pub fn append(&mut self, document: &Document) -> StoreResult<()> {
        let contents = self.contents("append to")?;
        let updated = writer::append_document(&self.path, &contents.manifest, document, self.sync)?;

        log_event_with_fields(
            Event::DocumentAppended,
            &[
                ("documents", &updated.documents.len().to_string()),
                ("name", document.name()),
            ],
        );

        if let Some(contents) = self.contents.as_mut() {
            contents.manifest = updated;
        }
        Ok(())
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.contents("count documents in")?.manifest.documents.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn corpus_name(&self) -> StoreResult<&str> {
        Ok(&self.contents("read the corpus name of")?.manifest.corpus_name)
    }

    /// Stored schemas, in stored order.
    pub fn schemas(&self) -> StoreResult<&[AnnotationSchema]> {
        Ok(self.contents("read schemas from")?.registry.schemas())
    }

    /// Registry holding the stored schemas, ready for validation.
    pub fn schema_registry(&self) -> StoreResult<&SchemaRegistry> {
        Ok(&self.contents("read schemas from")?.registry)
    }

    /// The manifest as last read or written.
    pub fn manifest(&self) -> StoreResult<&StoreManifest> {
        Ok(&self.contents("read the manifest of")?.manifest)
    }
}

fn load(path: &Path) -> StoreResult<(StoreManifest, SchemaRegistry)> {
    let manifest = StoreManifest::read_from_dir(path)?;
    reader::verify_payloads(path, &manifest.documents)?;

    let schemas = reader::read_schemas(path, &manifest.schemas)?;
    let registry = SchemaRegistry::from_schemas(schemas)
        .map_err(|e| StoreError::corrupt(path, format!("stored schemas rejected: {}", e)))?;

    Ok((manifest, registry))
}

/// Destructively rebuilds the store at `path` and returns it open.
pub fn rebuild<'a>(
    path: impl Into<PathBuf>,
    documents: impl IntoIterator<Item = &'a Document>,
    options: &RebuildOptions,
) -> StoreResult<Store> {
    let mut store = Store::new(path);
    store.rebuild(documents, options)?;
    Ok(store)
}

/// Opens the existing store at `path`.
pub fn open(path: impl Into<PathBuf>) -> StoreResult<Store> {
    let mut store = Store::new(path);
    store.open()?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FeatureMap;
    use crate::schema::FeatureSpec;
    use tempfile::TempDir;

    fn sample_documents() -> Vec<Document> {
        let mut first = Document::with_name("The cat sat.", "doc1");
        first
            .annotate(4, 7, "ANIMAL", FeatureMap::from([("species", "cat")]))
            .unwrap();
        vec![first, Document::with_name("Nothing here", "doc2")]
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_store_is_send_sync() {
        assert_send_sync::<Store>();
    }

    #[test]
    fn test_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus");

        let mut store = Store::new(&path);
        assert_eq!(store.state(), StoreState::Unopened);
        assert_eq!(
            store.documents().unwrap_err().code(),
            StoreErrorCode::StoreNotOpen
        );

        store
            .rebuild(&sample_documents(), &RebuildOptions::default())
            .unwrap();
        assert_eq!(store.state(), StoreState::Open);
        assert_eq!(store.corpus_name().unwrap(), DEFAULT_CORPUS_NAME);
        assert_eq!(store.len().unwrap(), 2);

        store.close();
        store.close();
        assert_eq!(store.state(), StoreState::Closed);
        assert_eq!(store.len().unwrap_err().code(), StoreErrorCode::StoreNotOpen);
    }

    #[test]
    fn test_open_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = open(tmp.path().join("absent")).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
    }

    #[test]
    fn test_random_access() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus");
        let store = rebuild(&path, &sample_documents(), &RebuildOptions::default()).unwrap();

        assert_eq!(store.document(1).unwrap().unwrap().name(), "doc2");
        assert!(store.document(2).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_schema_labels_are_refused() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus");
        let schema =
            AnnotationSchema::from_specs("ANIMAL", [FeatureSpec::new("species")]).unwrap();
        let options = RebuildOptions::default().with_schemas([schema.clone(), schema]);

        let err = rebuild(&path, &sample_documents(), &options).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Encode);
        assert!(!path.exists());
    }

    #[test]
    fn test_append_then_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("corpus");
        let options = RebuildOptions::default().with_sync(false);
        let mut store = rebuild(&path, &sample_documents(), &options).unwrap();

        store
            .append(&Document::with_name("Appended", "doc3"))
            .unwrap();
        assert_eq!(store.len().unwrap(), 3);
        store.close();

        let reopened = open(&path).unwrap();
        let names: Vec<String> = reopened
            .documents()
            .unwrap()
            .map(|d| d.unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["doc1", "doc2", "doc3"]);
    }

    #[test]
    fn test_append_requires_open_store() {
        let tmp = TempDir::new().unwrap();
        let mut store = Store::new(tmp.path().join("corpus"));
        let err = store
            .append(&Document::with_name("x", "doc"))
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::StoreNotOpen);
    }
}
