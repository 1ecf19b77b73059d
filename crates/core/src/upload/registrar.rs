//! Upload-completion registrar.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use super::error::UploadError;
use crate::metadata::{MetadataStore, UploadRecord};
use crate::storage::{BlobStore, PublicUrls, StorageError};

/// Records finished uploads in the metadata store.
pub struct UploadRegistrar {
    store: Arc<dyn MetadataStore>,
    urls: PublicUrls,
    blobs: Option<Arc<BlobStore>>,
    verify_on_complete: bool,
}

impl UploadRegistrar {
    /// Create a registrar writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MetadataStore>, urls: PublicUrls) -> Self {
        Self {
            store,
            urls,
            blobs: None,
            verify_on_complete: false,
        }
    }

    /// Attach the blob store used for proxied uploads and verification.
    #[must_use]
    pub fn with_blob_store(mut self, blobs: Arc<BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Check that the object exists before recording a completion.
    ///
    /// Completions fail as a storage error while no blob store is attached.
    #[must_use]
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_on_complete = enabled;
        self
    }

    /// Whether proxied uploads are possible.
    #[must_use]
    pub fn has_blob_store(&self) -> bool {
        self.blobs.is_some()
    }

    /// Record that `object_key` finished uploading.
    ///
    /// The stored record is keyed by `object_key`, so repeating the call
    /// replaces the earlier record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - either argument is empty (nothing is written)
    /// - verification is enabled and the object is missing, or there is no
    ///   blob store to check against
    /// - the metadata store write fails
    pub async fn register_completion(
        &self,
        object_key: &str,
        original_filename: &str,
    ) -> Result<UploadRecord, UploadError> {
        if object_key.trim().is_empty() {
            return Err(UploadError::invalid_input("objectKey is required"));
        }
        if original_filename.trim().is_empty() {
            return Err(UploadError::invalid_input("originalFilename is required"));
        }

        if self.verify_on_complete {
            let Some(blobs) = &self.blobs else {
                return Err(UploadError::Storage(StorageError::configuration(
                    "verification enabled but no blob store configured",
                )));
            };
            if !blobs.exists(object_key).await? {
                warn!(object_key = %object_key, "Completion reported for missing object");
                return Err(UploadError::NotVerified(object_key.to_string()));
            }
        }

        let record = UploadRecord::new(
            object_key,
            original_filename,
            self.urls.url_for(object_key),
            Utc::now(),
        );
        self.store.put(&record).await?;

        info!(
            object_key = %object_key,
            filename = %original_filename,
            backend = self.store.backend_name(),
            "Upload registered"
        );
        Ok(record)
    }

    /// Write `bytes` to storage on the client's behalf, then register them.
    ///
    /// # Errors
    ///
    /// Returns an error if no blob store is attached, the write fails, or
    /// registration fails.
    pub async fn store_and_register(
        &self,
        object_key: &str,
        original_filename: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<UploadRecord, UploadError> {
        let Some(blobs) = &self.blobs else {
            return Err(UploadError::Storage(StorageError::configuration(
                "no blob store configured",
            )));
        };
        if bytes.is_empty() {
            return Err(UploadError::invalid_input("file is empty"));
        }
        blobs.put(object_key, bytes, content_type).await?;
        self.register_completion(object_key, original_filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataError;
    use crate::storage::BlobProvider;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store keyed by object key.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, UploadRecord>>,
        writes: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl MetadataStore for MemoryStore {
        async fn put(&self, record: &UploadRecord) -> Result<(), MetadataError> {
            if self.fail {
                return Err(MetadataError::unavailable("disk full"));
            }
            *self.writes.lock().unwrap() += 1;
            self.records
                .lock()
                .unwrap()
                .insert(record.object_key.clone(), record.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<UploadRecord>, MetadataError> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        fn backend_name(&self) -> &'static str {
            "memory"
        }
    }

    fn urls() -> PublicUrls {
        PublicUrls::new("https://f004.backblazeb2.com", "openlapimages")
    }

    #[tokio::test]
    async fn test_register_completion_builds_record() {
        let store = Arc::new(MemoryStore::default());
        let registrar = UploadRegistrar::new(store.clone(), urls());

        let record = registrar
            .register_completion("prod-abc-000011223344.png", "vacation.png")
            .await
            .unwrap();

        assert_eq!(record.object_key, "prod-abc-000011223344.png");
        assert_eq!(record.original_filename, "vacation.png");
        assert_eq!(
            record.public_url,
            "https://f004.backblazeb2.com/file/openlapimages/prod-abc-000011223344.png"
        );
        assert!(record.timestamp.ends_with('Z'));

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[tokio::test]
    async fn test_repeat_completion_keeps_one_record() {
        let store = Arc::new(MemoryStore::default());
        let registrar = UploadRegistrar::new(store.clone(), urls());

        registrar.register_completion("k.png", "first.png").await.unwrap();
        registrar.register_completion("k.png", "second.png").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].original_filename, "second.png");
    }

    #[tokio::test]
    async fn test_empty_arguments_write_nothing() {
        let store = Arc::new(MemoryStore::default());
        let registrar = UploadRegistrar::new(store.clone(), urls());

        let err = registrar.register_completion("", "a.png").await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));
        let err = registrar.register_completion("k.png", "  ").await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));

        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });
        let registrar = UploadRegistrar::new(store, urls());

        let err = registrar.register_completion("k.png", "a.png").await.unwrap_err();
        assert!(matches!(err, UploadError::Store(MetadataError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_verification_rejects_missing_object() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(BlobStore::from_provider(&BlobProvider::Memory).unwrap());
        let registrar = UploadRegistrar::new(store.clone(), urls())
            .with_blob_store(blobs.clone())
            .with_verification(true);

        let err = registrar
            .register_completion("products/ghost-000000000000.png", "ghost.png")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotVerified(_)));
        assert_eq!(*store.writes.lock().unwrap(), 0);

        blobs
            .put(
                "products/ghost-000000000000.png",
                Bytes::from_static(b"GIF89a"),
                "image/gif",
            )
            .await
            .unwrap();
        registrar
            .register_completion("products/ghost-000000000000.png", "ghost.png")
            .await
            .unwrap();
        assert_eq!(*store.writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_verification_without_blob_store_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        let registrar = UploadRegistrar::new(store.clone(), urls()).with_verification(true);
        assert!(!registrar.has_blob_store());

        let err = registrar
            .register_completion("products/ghost-000000000000.png", "ghost.png")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Storage(StorageError::Configuration(_))
        ));
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_and_register() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(BlobStore::from_provider(&BlobProvider::Memory).unwrap());
        let registrar = UploadRegistrar::new(store.clone(), urls()).with_blob_store(blobs.clone());

        let record = registrar
            .store_and_register(
                "products/cat-0123456789ab.png",
                "cat.png",
                Bytes::from_static(b"\x89PNG"),
                "image/png",
            )
            .await
            .unwrap();

        assert!(blobs.exists(&record.object_key).await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_and_register_without_blob_store() {
        let registrar = UploadRegistrar::new(Arc::new(MemoryStore::default()), urls());
        let err = registrar
            .store_and_register("k.png", "a.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Storage(_)));
    }
}
