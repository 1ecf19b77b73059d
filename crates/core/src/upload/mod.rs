//! The direct-upload handshake.
//!
//! ```text
//! client ── POST /api/upload/auth ──▶ CredentialBroker ──▶ ObjectStorage
//! client ── bytes ─────────────────────────────────────▶ storage backend
//! client ── POST /api/upload/complete ▶ UploadRegistrar ──▶ MetadataStore
//! ```

mod broker;
mod error;
mod registrar;
mod types;

pub use broker::{
    AUTO_CONTENT_TYPE, CHECKSUM_AT_END, CHECKSUM_HEADER, CredentialBroker, FILE_NAME_HEADER,
    SKIP_CHECKSUM, fallback_upload_url,
};
pub use error::UploadError;
pub use registrar::UploadRegistrar;
pub use types::UploadCredential;
