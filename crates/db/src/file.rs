//! Flat JSON file store.
//!
//! On-disk shape:
//!
//! ```json
//! { "web_uploads": { "<object_key>": { "filename": "...", "url": "...",
//!   "timestamp": "...", "b2_filename": "..." } } }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use imagegate_core::metadata::{
    MetadataError, MetadataStore, UploadRecord, normalize_record, sort_newest_first,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct UploadsFile {
    #[serde(default)]
    web_uploads: Map<String, Value>,
    /// Top-level keys written by other tools, carried through untouched.
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Metadata store backed by a single JSON file.
///
/// Writers are serialized by an in-process lock and each write replaces the
/// file atomically, so readers never see a partial document.
#[derive(Debug)]
pub struct FileMetadataStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileMetadataStore {
    /// Open the store at `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// file cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MetadataError::Uninitialized(format!("{}: {e}", parent.display()))
            })?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };
        let existing = store.read().await?;
        debug!(
            path = %store.path.display(),
            records = existing.web_uploads.len(),
            "File metadata store opened"
        );
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<UploadsFile, MetadataError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UploadsFile::default()),
            Err(e) => return Err(e.into()),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(UploadsFile::default());
        }
        serde_json::from_slice(&raw)
            .map_err(|e| MetadataError::corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn write(&self, contents: &UploadsFile) -> Result<(), MetadataError> {
        let encoded =
            serde_json::to_vec_pretty(contents).map_err(|e| MetadataError::Encode(e.to_string()))?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, encoded).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn put(&self, record: &UploadRecord) -> Result<(), MetadataError> {
        let entry =
            serde_json::to_value(record).map_err(|e| MetadataError::Encode(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        let mut contents = self.read().await?;
        contents
            .web_uploads
            .insert(record.object_key.clone(), entry);
        self.write(&contents).await?;

        debug!(object_key = %record.object_key, "Record written to file store");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UploadRecord>, MetadataError> {
        let contents = self.read().await?;

        let mut records: Vec<UploadRecord> = contents
            .web_uploads
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Object(fields) => Some(normalize_record(fields, key)),
                _ => {
                    warn!(key = %key, "Skipping non-object upload entry");
                    None
                }
            })
            .collect();

        sort_newest_first(&mut records);
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
