//! Startup store selection.

use std::time::Duration;

use chrono::Utc;
use imagegate_core::metadata::{MetadataError, UploadRecord};
use imagegate_db::open_store;
use imagegate_shared::{MetadataBackend, MetadataConfig};
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> MetadataConfig {
    MetadataConfig {
        backend: MetadataBackend::File,
        file_path: dir
            .path()
            .join("nested/uploaded_images.json")
            .to_string_lossy()
            .into_owned(),
        firestore: None,
    }
}

#[tokio::test]
async fn test_open_file_store() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&file_config(&dir), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(store.backend_name(), "file");
    store
        .put(&UploadRecord::new("k.png", "k.png", "https://cdn/k.png", Utc::now()))
        .await
        .unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_corrupt_file_store_fails() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();
    std::fs::write(&config.file_path, "not json").unwrap();

    let err = open_store(&config, Duration::from_secs(5)).await.err().unwrap();
    assert!(matches!(err, MetadataError::Corrupt(_)));
}

#[tokio::test]
async fn test_open_firestore_without_settings_fails() {
    let config = MetadataConfig {
        backend: MetadataBackend::Firestore,
        file_path: String::new(),
        firestore: None,
    };

    let err = open_store(&config, Duration::from_secs(5)).await.err().unwrap();
    assert!(matches!(err, MetadataError::Uninitialized(_)));
}
