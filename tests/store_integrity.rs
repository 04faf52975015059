//! Store Integrity Tests
//!
//! - A path without a manifest is not a store
//! - Missing or modified payloads are detected at open
//! - Damage after open is reported by the iterator, never skipped
//! - A refused rebuild leaves the previous store intact
//! - Values JSON cannot hold are refused, never stored

use annostore::document::{Document, FeatureMap};
use annostore::store::{self, RebuildOptions, StoreErrorCode, MANIFEST_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn build_store(dir: &Path) -> PathBuf {
    let path = dir.join("corpus");
    let docs: Vec<Document> = (0..3)
        .map(|i| {
            let mut doc = Document::with_name(format!("document number {}", i), format!("d{}", i));
            doc.annotate(0, 8, "NOUN", FeatureMap::new()).unwrap();
            doc
        })
        .collect();
    store::rebuild(&path, &docs, &RebuildOptions::default()).unwrap();
    path
}

// =============================================================================
// Missing Stores
// =============================================================================

#[test]
fn test_open_nonexistent_path_is_not_found() {
    let temp_dir = create_temp_dir();
    let err = store::open(temp_dir.path().join("nothing-here")).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::NotFound);
}

#[test]
fn test_open_directory_without_manifest_is_not_found() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("empty");
    fs::create_dir_all(path.join("documents")).unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::NotFound);
}

#[test]
fn test_open_plain_file_is_not_found() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("file.txt");
    fs::write(&path, "not a store").unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::NotFound);
}

// =============================================================================
// Damage Detected at Open
// =============================================================================

#[test]
fn test_missing_payload_is_corrupt() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());
    fs::remove_file(path.join("documents/000002.json")).unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
}

#[test]
fn test_flipped_byte_is_corrupt() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());
    let payload = path.join("documents/000001.json");

    let mut contents = fs::read(&payload).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&payload, contents).unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
    assert!(
        err.to_string().to_lowercase().contains("checksum"),
        "error should mention checksum, got: {}",
        err
    );
}

#[test]
fn test_garbage_manifest_is_corrupt() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());
    fs::write(path.join(MANIFEST_FILE), "{ not json").unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
}

#[test]
fn test_manifest_pointing_outside_store_is_corrupt() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());

    let manifest_path = path.join(MANIFEST_FILE);
    let manifest = fs::read_to_string(&manifest_path).unwrap();
    let tampered = manifest.replace("documents/000000.json", "../outside.json");
    fs::write(&manifest_path, tampered).unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
}

#[test]
fn test_damaged_schema_payload_is_corrupt() {
    use annostore::schema::{AnnotationSchema, FeatureSpec};

    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("corpus");
    let schema = AnnotationSchema::from_specs("NOUN", [FeatureSpec::new("number")]).unwrap();
    store::rebuild(
        &path,
        [&Document::with_name("x", "d")],
        &RebuildOptions::default().with_schemas([schema]),
    )
    .unwrap();

    fs::remove_file(path.join("schemas/000000.json")).unwrap();

    let err = store::open(&path).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
}

// =============================================================================
// Damage After Open
// =============================================================================

#[test]
fn test_payload_damaged_after_open_fails_iteration() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());
    let store = store::open(&path).unwrap();

    fs::write(path.join("documents/000001.json"), b"[]").unwrap();

    let results: Vec<_> = store.documents().unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().unwrap_err().code(),
        StoreErrorCode::CorruptStore
    );
    assert!(results[2].is_ok());
}

// =============================================================================
// Atomic Rebuild
// =============================================================================

#[test]
fn test_rebuild_leaves_no_temporary_files() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());

    let mut entries: Vec<String> = fs::read_dir(&path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["documents", "manifest.json", "schemas"]);
}

#[test]
fn test_refused_rebuild_keeps_previous_store() {
    use annostore::schema::{AnnotationSchema, FeatureSpec};

    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());

    // Two schemas with one label are refused before anything is written
    let schema = AnnotationSchema::from_specs("NOUN", [FeatureSpec::new("number")]).unwrap();
    let options = RebuildOptions::default().with_schemas([schema.clone(), schema]);
    let err = store::rebuild(&path, [&Document::with_name("x", "d")], &options).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::Encode);

    // The previous store is untouched
    let store = store::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn test_non_finite_float_is_refused_before_delete() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut doc = Document::with_name("The cat sat.", "d");
        doc.annotate(4, 7, "ANIMAL", FeatureMap::from([("score", value)]))
            .unwrap();

        let err = store::rebuild(&path, [&doc], &RebuildOptions::default()).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Encode);
    }

    // Every stored document still reads back
    let store = store::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 3);
    for document in store.documents().unwrap() {
        assert!(document.is_ok());
    }
}

#[test]
fn test_non_finite_float_is_refused_on_append() {
    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());
    let mut store = store::open(&path).unwrap();

    let mut doc = Document::with_name("x", "d");
    doc.features_mut().put("score", f64::NAN);
    let err = store.append(&doc).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::Encode);

    assert_eq!(store.len().unwrap(), 3);
    assert!(!path.join("documents/000003.json").exists());
}

#[test]
fn test_exhausted_ordinal_is_corrupt_not_a_crash() {
    use annostore::store::{compute_checksum, format_checksum};

    let temp_dir = create_temp_dir();
    let path = build_store(temp_dir.path());

    // Rewrite one payload and its checksum so only the content is wrong
    let payload = br#"{"name":"d1","content":"document number 1","features":{},"annotations":[{"id":18446744073709551615,"label":"NOUN","start":0,"end":8,"features":{}}]}"#;
    fs::write(path.join("documents/000001.json"), payload).unwrap();

    let manifest_path = path.join(MANIFEST_FILE);
    let mut manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    manifest["documents"][1]["checksum"] =
        serde_json::Value::from(format_checksum(compute_checksum(payload)));
    fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    let store = store::open(&path).unwrap();
    let err = store.document(1).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::CorruptStore);
}
