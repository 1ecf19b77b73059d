//! Byte-level object access through Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::error::StorageError;

/// Which OpenDAL service backs the blob store.
#[derive(Clone)]
pub enum BlobProvider {
    /// Backblaze B2 bucket.
    B2 {
        /// Application key ID.
        key_id: String,
        /// Application key.
        application_key: String,
        /// Bucket name.
        bucket_name: String,
        /// Bucket ID.
        bucket_id: String,
    },
    /// Process-local memory (tests and offline runs).
    Memory,
}

impl BlobProvider {
    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::B2 { .. } => "b2",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Debug for BlobProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::B2 {
                bucket_name,
                bucket_id,
                ..
            } => f
                .debug_struct("B2")
                .field("bucket_name", bucket_name)
                .field("bucket_id", bucket_id)
                .finish_non_exhaustive(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Writes and inspects objects in the bucket.
#[derive(Debug, Clone)]
pub struct BlobStore {
    operator: Operator,
    provider: &'static str,
}

impl BlobStore {
    /// Create a blob store for `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the OpenDAL service cannot be initialized.
    pub fn from_provider(provider: &BlobProvider) -> Result<Self, StorageError> {
        let operator = match provider {
            BlobProvider::B2 {
                key_id,
                application_key,
                bucket_name,
                bucket_id,
            } => {
                let builder = services::B2::default()
                    .application_key_id(key_id)
                    .application_key(application_key)
                    .bucket(bucket_name)
                    .bucket_id(bucket_id);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            BlobProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };

        Ok(Self {
            operator,
            provider: provider.name(),
        })
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider
    }

    /// Write `bytes` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = bytes.len();
        self.operator
            .write_with(key, bytes)
            .content_type(content_type)
            .await?;

        debug!(key = %key, size, provider = self.provider, "Object written");
        Ok(())
    }

    /// Whether an object exists under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot answer; a missing object is
    /// `Ok(false)`.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from(e)),
        }
    }
}
