//! Metadata store error types.

use thiserror::Error;

/// Metadata store errors.
///
/// Every variant means the store cannot serve the request right now; the
/// API layer reports all of them as "store unavailable".
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The backing store could not be reached.
    #[error("metadata store unreachable: {0}")]
    Unavailable(String),

    /// The store was used before its startup check succeeded.
    #[error("metadata store not initialized: {0}")]
    Uninitialized(String),

    /// Stored data could not be parsed.
    #[error("metadata store data is corrupt: {0}")]
    Corrupt(String),

    /// A record could not be encoded for storage.
    #[error("failed to encode record: {0}")]
    Encode(String),
}

impl MetadataError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a corrupt-data error.
    #[must_use]
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}
