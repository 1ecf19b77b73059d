//! Core upload logic for imagegate.
//!
//! This crate contains the direct-upload handshake with ZERO web framework
//! or persistence dependencies. Stores and HTTP handlers live elsewhere and
//! plug in through the traits defined here.
//!
//! # Modules
//!
//! - `auth` - Shared-password hashing and verification
//! - `naming` - Object key generation and filename validation
//! - `storage` - Object storage client adapter (Backblaze B2) and blob store
//! - `metadata` - Upload record model and the `MetadataStore` capability
//! - `upload` - Credential broker and completion registrar

pub mod auth;
pub mod metadata;
pub mod naming;
pub mod storage;
pub mod upload;
