use fhub_storage::{Storage, StorageError};
use std::time::Duration;
use tempfile::TempDir;

async fn open(temp: &TempDir) -> Storage {
    Storage::builder(temp.path().join("uploads")).connect().await.unwrap()
}

#[tokio::test]
async fn path_traversal_is_blocked() {
    let temp = TempDir::new().unwrap();
    let storage = open(&temp).await;

    assert!(matches!(
        storage.resolve("../etc/passwd"),
        Err(StorageError::PathTraversalAttempt { .. })
    ));
    assert!(storage.resolve("C100/../../outside.pdf").is_err());
    assert!(storage.write("/etc/owned", b"x").await.is_err());
    assert!(!temp.path().join("outside.pdf").exists());
}

#[tokio::test]
async fn write_creates_nested_directories() {
    let temp = TempDir::new().unwrap();
    let storage = open(&temp).await;

    storage.write("C100/TAS1/a1-invoice.pdf", b"%PDF-1.7").await.unwrap();

    assert!(storage.exists("C100/TAS1/a1-invoice.pdf").unwrap());
    assert_eq!(storage.read("C100/TAS1/a1-invoice.pdf").await.unwrap(), b"%PDF-1.7");
    assert!(storage.root().join("C100/TAS1/a1-invoice.pdf").is_file());
}

#[tokio::test]
async fn write_replaces_existing_file_without_leftovers() {
    let temp = TempDir::new().unwrap();
    let storage = open(&temp).await;

    storage.write("C100/doc.png", b"first").await.unwrap();
    storage.write("C100/doc.png", b"second").await.unwrap();
    assert_eq!(storage.read("C100/doc.png").await.unwrap(), b"second");

    let names: Vec<_> = std::fs::read_dir(storage.root().join("C100"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["doc.png"]);
}

#[tokio::test]
async fn delete_and_rollback() {
    let temp = TempDir::new().unwrap();
    let storage = open(&temp).await;

    storage.write("a/one.pdf", b"1").await.unwrap();
    storage.write("a/two.pdf", b"2").await.unwrap();

    storage.delete("a/one.pdf").await.unwrap();
    assert!(!storage.exists("a/one.pdf").unwrap());
    assert!(matches!(storage.delete("a/one.pdf").await, Err(StorageError::FileNotFound { .. })));

    storage.delete_all(&["a/one.pdf", "a/two.pdf"]).await;
    assert!(!storage.exists("a/two.pdf").unwrap());
}

#[tokio::test]
async fn read_missing_returns_file_not_found() {
    let temp = TempDir::new().unwrap();
    let storage = open(&temp).await;

    let err = storage.read("missing.pdf").await.expect_err("expected error");
    assert_eq!(err.code(), "file_not_found");
}

#[tokio::test]
async fn stale_temporaries_are_purged_on_connect() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("uploads");
    std::fs::create_dir_all(root.join("C100")).unwrap();
    std::fs::write(root.join("C100/doc.pdf.fhubtmp.1.1"), b"partial").unwrap();
    std::fs::write(root.join("C100/keep.pdf"), b"done").unwrap();

    let storage =
        Storage::builder(&root).tmp_ttl(Duration::ZERO).connect().await.unwrap();

    assert!(!root.join("C100/doc.pdf.fhubtmp.1.1").exists());
    assert!(storage.exists("C100/keep.pdf").unwrap());
}

#[tokio::test]
async fn missing_root_fails_without_create() {
    let temp = TempDir::new().unwrap();
    let result = Storage::builder(temp.path().join("nope")).create(false).connect().await;
    assert!(matches!(result, Err(StorageError::Io { .. })));
}
