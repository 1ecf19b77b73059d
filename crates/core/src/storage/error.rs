//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Credentials rejected or session expired.
    #[error("storage authorization rejected: {0}")]
    Unauthorized(String),

    /// The configured bucket does not exist or is not visible to the key.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// The storage API answered with an error document.
    #[error("storage API error {status} ({code}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },

    /// The backend could not be reached.
    #[error("storage backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with something we could not decode.
    #[error("unexpected storage response: {0}")]
    Decode(String),

    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the backend rejected our credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::PermissionDenied => Self::Unauthorized(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}
