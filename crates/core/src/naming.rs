//! Object key generation.
//!
//! Every stored object gets a key of the form
//! `{prefix}{stem}-{random_id}{.ext}` so that two uploads of the same file
//! never collide in the bucket.

use std::ffi::OsStr;
use std::path::Path;

use uuid::Uuid;

use crate::upload::UploadError;

/// File extensions accepted for upload (compared lower-cased).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["webp", "jpg", "jpeg", "png", "gif"];

/// Number of hex characters in the random part of a key.
pub const RANDOM_ID_LEN: usize = 12;

/// Derives unique object keys from user-supplied filenames.
#[derive(Debug, Clone)]
pub struct ObjectKeyGenerator {
    prefix: String,
}

impl ObjectKeyGenerator {
    /// Create a generator that prepends `prefix` to every key.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generate a fresh object key for `original_filename`.
    ///
    /// Pure apart from the random identifier: no I/O, never fails. Callers
    /// are expected to run [`validate_filename`] first.
    #[must_use]
    pub fn generate(&self, original_filename: &str) -> String {
        let path = Path::new(original_filename);
        let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or_default();
        let ext = extension_of(original_filename)
            .map(|e| format!(".{}", sanitize_filename(&e)))
            .unwrap_or_default();

        let random_id = Uuid::new_v4().simple().to_string();

        format!(
            "{}{}-{}{}",
            self.prefix,
            sanitize_filename(stem),
            &random_id[..RANDOM_ID_LEN],
            ext
        )
    }
}

/// Lower-cased extension of `filename`, without the dot.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Whether `filename` carries one of the [`ALLOWED_EXTENSIONS`].
#[must_use]
pub fn is_allowed_extension(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reject empty filenames and disallowed extensions.
///
/// # Errors
///
/// Returns `UploadError::InvalidInput` describing the problem.
pub fn validate_filename(filename: &str) -> Result<(), UploadError> {
    if filename.trim().is_empty() {
        return Err(UploadError::invalid_input("filename is required"));
    }
    if !is_allowed_extension(filename) {
        return Err(UploadError::invalid_input(format!(
            "file type not allowed, expected one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

/// Sanitize a filename fragment for use in an object key.
///
/// Only ASCII alphanumeric characters, dots, hyphens, and underscores are
/// kept; everything else becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
