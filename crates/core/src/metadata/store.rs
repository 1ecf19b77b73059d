//! The metadata store capability.

use async_trait::async_trait;

use super::error::MetadataError;
use super::record::UploadRecord;

/// Durable home of upload records.
///
/// Implementations are selected at startup and injected; the store is the
/// only reader and writer of records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upsert `record` keyed by its object key.
    async fn put(&self, record: &UploadRecord) -> Result<(), MetadataError>;

    /// Every record, newest first.
    async fn list(&self) -> Result<Vec<UploadRecord>, MetadataError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
