//! Store read path
//!
//! `verify_payloads` runs at open: every payload listed in the manifest
//! must exist and match its recorded CRC32. Documents are then decoded
//! lazily, one payload per `DocumentIter::next`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::slice;

use super::checksum::{compute_checksum, format_checksum, parse_checksum};
use super::codec::{decode_document, decode_schema};
use super::errors::{StoreError, StoreResult};
use super::manifest::PayloadEntry;
use crate::document::Document;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::AnnotationSchema;

/// Reads a payload and checks it against the manifest entry.
fn read_payload(store_dir: &Path, entry: &PayloadEntry) -> StoreResult<(PathBuf, Vec<u8>)> {
    let path = entry.resolve(store_dir)?;

    let expected = parse_checksum(&entry.checksum).ok_or_else(|| {
        StoreError::corrupt(
            store_dir,
            format!("entry {} has malformed checksum '{}'", entry.id, entry.checksum),
        )
    })?;

    let bytes = fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            StoreError::corrupt(&path, format!("payload for {} is missing", entry.id))
        }
        _ => StoreError::io_error_at_path(&path, e),
    })?;

    let actual = compute_checksum(&bytes);
    if actual != expected {
        return Err(StoreError::corrupt(
            &path,
            format!(
                "checksum mismatch for {}: expected {}, found {}",
                entry.id,
                entry.checksum,
                format_checksum(actual)
            ),
        ));
    }

    Ok((path, bytes))
}

/// Checks that every document payload exists and matches its checksum.
pub(crate) fn verify_payloads(store_dir: &Path, entries: &[PayloadEntry]) -> StoreResult<()> {
    for entry in entries {
        read_payload(store_dir, entry)?;
    }
    Ok(())
}

/// Reads and decodes every schema payload, in manifest order.
pub(crate) fn read_schemas(
    store_dir: &Path,
    entries: &[PayloadEntry],
) -> StoreResult<Vec<AnnotationSchema>> {
    entries
        .iter()
        .map(|entry| {
            let (path, bytes) = read_payload(store_dir, entry)?;
            decode_schema(&path, &bytes)
        })
        .collect()
}

/// Reads and decodes one document payload.
pub(crate) fn read_document(store_dir: &Path, entry: &PayloadEntry) -> StoreResult<Document> {
    let result = read_payload(store_dir, entry)
        .and_then(|(path, bytes)| decode_document(&path, &bytes));

    if let Err(ref e) = result {
        log_event_with_fields(
            Event::PayloadCorrupt,
            &[("id", &entry.id), ("reason", &e.to_string())],
        );
    }

    result
}

/// Lazy iterator over the documents of an open store, in stored order.
///
/// Each call to `next` reads and decodes exactly one payload. Call
/// `Store::documents` again to restart from the first document.
#[derive(Debug, Clone)]
pub struct DocumentIter<'a> {
    store_dir: &'a Path,
    entries: slice::Iter<'a, PayloadEntry>,
}

impl<'a> DocumentIter<'a> {
    pub(crate) fn new(store_dir: &'a Path, entries: &'a [PayloadEntry]) -> Self {
        Self {
            store_dir,
            entries: entries.iter(),
        }
    }
}

impl Iterator for DocumentIter<'_> {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(read_document(self.store_dir, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for DocumentIter<'_> {}
