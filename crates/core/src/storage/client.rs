//! The storage capability the upload handshake depends on.

use async_trait::async_trait;

use super::error::StorageError;

/// An authorized session bound to one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketHandle {
    /// Bucket ID.
    pub bucket_id: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Base URL for API calls made with this session.
    pub api_url: String,
    /// Account authorization token for this session.
    pub authorization_token: String,
}

/// A pre-issued, single-use upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Where the bytes are POSTed.
    pub upload_url: String,
    /// Token for the `Authorization` header of the upload.
    pub authorization_token: String,
}

/// Account-level authorization, used when no upload URL can be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAuthorization {
    /// Account ID.
    pub account_id: String,
    /// Base URL for API calls.
    pub api_url: String,
    /// Account authorization token.
    pub authorization_token: String,
    /// Base URL for downloads.
    pub download_url: String,
}

/// Remote blob-storage account as seen by the upload handshake.
///
/// Implementations perform a network round-trip on every call; nothing is
/// cached between calls.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Authorize the account and resolve the configured bucket.
    async fn authorize_bucket(&self) -> Result<BucketHandle, StorageError>;

    /// Ask the backend for a single-use upload URL scoped to `bucket`.
    async fn get_upload_url(&self, bucket: &BucketHandle) -> Result<UploadTarget, StorageError>;

    /// Fetch a fresh account-level authorization.
    async fn account_authorization(&self) -> Result<AccountAuthorization, StorageError>;
}
