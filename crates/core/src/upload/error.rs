//! Upload error types.

use thiserror::Error;

use crate::metadata::MetadataError;
use crate::storage::StorageError;

/// Upload handshake errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Bad or missing request fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Could not authorize against object storage.
    #[error("storage authorization failed: {0}")]
    StorageAuth(#[source] StorageError),

    /// Neither the primary nor the fallback path produced a credential.
    #[error("no upload credential available (primary: {primary}; fallback: {fallback})")]
    CredentialBroker {
        /// Why the pre-issued upload URL request failed.
        primary: StorageError,
        /// Why the account-level fallback failed.
        fallback: StorageError,
    },

    /// The object named in a completion call is not in storage.
    #[error("upload not verified: {0} not found in storage")]
    NotVerified(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Metadata store operation failed.
    #[error("metadata store error: {0}")]
    Store(#[from] MetadataError),
}

impl UploadError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
