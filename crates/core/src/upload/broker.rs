//! Upload-credential broker.

use std::collections::BTreeMap;
use std::sync::Arc;

use imagegate_shared::ChecksumMode;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{error, info, warn};

use super::error::UploadError;
use super::types::UploadCredential;
use crate::storage::ObjectStorage;

/// Header carrying the object key on a direct upload.
pub const FILE_NAME_HEADER: &str = "X-Bz-File-Name";
/// Header carrying the content checksum on a direct upload.
pub const CHECKSUM_HEADER: &str = "X-Bz-Content-Sha1";
/// Checksum header value that disables verification.
pub const SKIP_CHECKSUM: &str = "do_not_verify";
/// Checksum header value for a SHA-1 appended to the body.
pub const CHECKSUM_AT_END: &str = "hex_digits_at_end";
/// Content type letting the backend sniff the real one.
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";

const UPLOAD_FILE_PATH: &str = "b2api/v2/b2_upload_file";
const SHA1_HEX_LEN: usize = 40;

/// Bytes left as-is in the file name header: unreserved characters and `/`.
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode an object key for the file name header.
fn encode_file_name(object_key: &str) -> String {
    utf8_percent_encode(object_key, FILE_NAME_ENCODE_SET).to_string()
}

/// Upload URL built from an account authorization.
#[must_use]
pub fn fallback_upload_url(api_url: &str, bucket_id: &str) -> String {
    format!(
        "{}/{UPLOAD_FILE_PATH}/{bucket_id}",
        api_url.trim_end_matches('/')
    )
}

/// Obtains short-lived direct-upload credentials from object storage.
pub struct CredentialBroker {
    storage: Arc<dyn ObjectStorage>,
    checksum: ChecksumMode,
}

impl CredentialBroker {
    /// Create a broker over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, checksum: ChecksumMode) -> Self {
        Self { storage, checksum }
    }

    /// Request a credential for uploading `object_key`.
    ///
    /// Tries a pre-issued upload URL first and falls back to an
    /// account-level authorization with a templated URL. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `object_key` is empty or `content_sha1` is not 40 hex digits
    /// - the bucket cannot be authorized
    /// - both the primary and the fallback path fail
    pub async fn request_upload_credential(
        &self,
        object_key: &str,
        content_sha1: Option<&str>,
    ) -> Result<UploadCredential, UploadError> {
        if object_key.trim().is_empty() {
            return Err(UploadError::invalid_input("object key is required"));
        }
        let checksum = self.checksum_header(content_sha1)?;

        let bucket = self
            .storage
            .authorize_bucket()
            .await
            .map_err(UploadError::StorageAuth)?;

        let (upload_url, authorization_token) = match self.storage.get_upload_url(&bucket).await {
            Ok(target) => (target.upload_url, target.authorization_token),
            Err(primary) => {
                warn!(
                    error = %primary,
                    bucket_id = %bucket.bucket_id,
                    "Upload URL request failed, falling back to account authorization"
                );
                match self.storage.account_authorization().await {
                    Ok(account) => (
                        fallback_upload_url(&account.api_url, &bucket.bucket_id),
                        account.authorization_token,
                    ),
                    Err(fallback) => {
                        error!(
                            primary = %primary,
                            fallback = %fallback,
                            "Could not obtain an upload credential"
                        );
                        return Err(UploadError::CredentialBroker { primary, fallback });
                    }
                }
            }
        };

        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), authorization_token.clone());
        headers.insert(FILE_NAME_HEADER.to_string(), encode_file_name(object_key));
        headers.insert("Content-Type".to_string(), AUTO_CONTENT_TYPE.to_string());
        headers.insert(CHECKSUM_HEADER.to_string(), checksum);

        info!(object_key = %object_key, bucket_id = %bucket.bucket_id, "Upload credential issued");

        Ok(UploadCredential {
            upload_url,
            authorization_token,
            object_key: object_key.to_string(),
            bucket_id: bucket.bucket_id,
            headers,
        })
    }

    fn checksum_header(&self, content_sha1: Option<&str>) -> Result<String, UploadError> {
        let supplied = match content_sha1.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sha1) if sha1.len() == SHA1_HEX_LEN && sha1.chars().all(|c| c.is_ascii_hexdigit()) => {
                Some(sha1.to_ascii_lowercase())
            }
            Some(_) => {
                return Err(UploadError::invalid_input(
                    "content_sha1 must be 40 hexadecimal characters",
                ));
            }
            None => None,
        };

        Ok(match self.checksum {
            ChecksumMode::Skip => SKIP_CHECKSUM.to_string(),
            ChecksumMode::Verify => supplied.unwrap_or_else(|| CHECKSUM_AT_END.to_string()),
        })
    }
}
