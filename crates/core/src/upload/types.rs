//! Upload handshake types.

use std::collections::BTreeMap;

/// Everything a client needs to upload one object directly to storage.
///
/// Never persisted. Its lifetime is set by the storage backend, so clients
/// request a fresh credential for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCredential {
    /// Endpoint accepting the byte-stream POST.
    pub upload_url: String,
    /// Single-use, time-limited upload token.
    pub authorization_token: String,
    /// Key the object must be stored under.
    pub object_key: String,
    /// Target bucket.
    pub bucket_id: String,
    /// Headers the upload request must carry.
    pub headers: BTreeMap<String, String>,
}
