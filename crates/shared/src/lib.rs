//! Shared configuration and error types for imagegate.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration (environment + optional config files)
//! - Application-wide error type with HTTP status mapping

pub mod config;
pub mod error;

pub use config::{
    AppConfig, AuthConfig, ChecksumMode, ConfigValidationError, FirestoreConfig, MetadataBackend,
    MetadataConfig, ServerConfig, StorageSettings,
};
pub use error::AppError;
