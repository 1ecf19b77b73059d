//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The upload handshake endpoints
//! - The shared-password login and the session gate
//! - Mapping of domain errors to JSON responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::header::{AUTHORIZATION, COOKIE, SET_COOKIE},
};
use axum_extra::extract::cookie::Key;
use imagegate_core::{
    auth::SharedPassword,
    metadata::MetadataStore,
    naming::ObjectKeyGenerator,
    upload::{CredentialBroker, UploadRegistrar},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::trace::TraceLayer;

pub use middleware::session::SessionSettings;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Issues direct-upload credentials.
    pub broker: Arc<CredentialBroker>,
    /// Records finished uploads.
    pub registrar: Arc<UploadRegistrar>,
    /// Upload metadata, read by the listing endpoint.
    pub store: Arc<dyn MetadataStore>,
    /// Derives object keys from filenames.
    pub keys: Arc<ObjectKeyGenerator>,
    /// The shared login password.
    pub password: Arc<SharedPassword>,
    /// Session cookie signing key and lifetime.
    pub session: SessionSettings,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session.key.clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::app_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveHeadersLayer::new([
            AUTHORIZATION,
            COOKIE,
            SET_COOKIE,
        ]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
