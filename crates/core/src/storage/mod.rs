//! Object storage adapter for Backblaze B2.
//!
//! Two views of the same bucket live here:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────┐
//! │ ObjectStorage (B2 native API)│ BlobStore (Apache OpenDAL)       │
//! ├──────────────────────────────┼──────────────────────────────────┤
//! │ authorize_bucket()           │ put(key, bytes, content_type)    │
//! │ get_upload_url(bucket)       │ exists(key)                      │
//! │ account_authorization()      │                                  │
//! └──────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! The native API hands out direct-upload credentials, which OpenDAL does
//! not expose. OpenDAL carries the bytes for server-proxied uploads and
//! answers existence checks.

mod b2;
mod blob;
mod client;
mod config;
mod error;

pub use b2::B2Client;
pub use blob::{BlobProvider, BlobStore};
pub use client::{AccountAuthorization, BucketHandle, ObjectStorage, UploadTarget};
pub use config::{PublicUrls, StorageConfig};
pub use error::StorageError;
