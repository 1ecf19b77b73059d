//! Metadata stores for imagegate.
//!
//! This crate provides the two [`MetadataStore`] implementations and the
//! startup selector between them:
//! - [`FileMetadataStore`]: the legacy flat JSON file
//! - [`FirestoreMetadataStore`]: a Firestore collection over REST

mod file;
mod firestore;

pub use file::FileMetadataStore;
pub use firestore::{FirestoreMetadataStore, ServiceAccountKey};

use std::sync::Arc;
use std::time::Duration;

use imagegate_core::metadata::{MetadataError, MetadataStore};
use imagegate_shared::{MetadataBackend, MetadataConfig};
use tracing::info;

/// Opens the configured metadata store and checks it is usable.
///
/// # Errors
///
/// Returns an error if the store cannot be initialized: the data file is
/// unreadable or corrupt, or no Firestore access token can be obtained.
pub async fn open_store(
    config: &MetadataConfig,
    request_timeout: Duration,
) -> Result<Arc<dyn MetadataStore>, MetadataError> {
    let store: Arc<dyn MetadataStore> = match config.backend {
        MetadataBackend::File => Arc::new(FileMetadataStore::open(&config.file_path).await?),
        MetadataBackend::Firestore => {
            let firestore = config.firestore.as_ref().ok_or_else(|| {
                MetadataError::Uninitialized("firestore settings are missing".to_string())
            })?;
            Arc::new(FirestoreMetadataStore::connect(firestore, request_timeout).await?)
        }
    };

    info!(backend = store.backend_name(), "Metadata store ready");
    Ok(store)
}
