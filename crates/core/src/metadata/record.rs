//! The canonical upload record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about one uploaded object.
///
/// Serialized with the field names clients and stored documents already
/// use: `filename`, `url`, `b2_filename`, `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Filename as supplied by the uploader.
    #[serde(rename = "filename")]
    pub original_filename: String,
    /// Public URL of the object.
    #[serde(rename = "url")]
    pub public_url: String,
    /// Object key; unique across all records.
    #[serde(rename = "b2_filename")]
    pub object_key: String,
    /// When the upload was registered (ISO-8601).
    pub timestamp: String,
}

impl UploadRecord {
    /// Create a record stamped with `at`.
    #[must_use]
    pub fn new(
        object_key: impl Into<String>,
        original_filename: impl Into<String>,
        public_url: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            public_url: public_url.into(),
            object_key: object_key.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}
