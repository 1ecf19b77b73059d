//! Upload handshake routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    response::Html,
    routing::{get, post},
};
use imagegate_core::{metadata::UploadRecord, naming::validate_filename};
use imagegate_shared::AppError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Body of `POST /api/upload/auth`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadAuthRequest {
    /// Name of the file the client wants to upload.
    pub filename: Option<String>,
    /// Hex SHA-1 of the file, when the client computed one.
    pub content_sha1: Option<String>,
}

/// Credential handed to the client.
#[derive(Debug, Serialize)]
pub struct UploadAuthResponse {
    /// Always `true`.
    pub success: bool,
    /// Where to POST the bytes.
    pub upload_url: String,
    /// Upload token.
    pub authorization_token: String,
    /// Key the object will be stored under.
    #[serde(rename = "objectKey")]
    pub object_key: String,
    /// Target bucket.
    pub bucket_id: String,
    /// Headers the upload request must carry.
    pub headers: BTreeMap<String, String>,
}

/// Body of `POST /api/upload/complete`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompleteRequest {
    /// Object key from the credential.
    #[serde(alias = "objectKey")]
    pub b2_filename: Option<String>,
    /// Filename the user picked.
    pub original_filename: Option<String>,
}

/// Result of a completed upload.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    /// Always `true`.
    pub success: bool,
    /// Public URL of the object.
    pub url: String,
    /// Original filename.
    pub filename: String,
}

/// Result of a server-proxied upload.
#[derive(Debug, Serialize)]
pub struct ProxiedUploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Public URL of the object.
    pub url: String,
    /// Original filename.
    pub filename: String,
}

/// Every registered upload, newest first.
#[derive(Debug, Serialize)]
pub struct UploadListResponse {
    /// The records.
    pub images: Vec<UploadRecord>,
}

/// Creates the upload router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/upload/auth", post(upload_auth))
        .route("/api/upload/complete", post(upload_complete))
        .route("/uploads", get(list_uploads))
        .route("/upload", post(upload_file))
}

/// GET / - minimal upload page.
async fn index() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>imagegate</title></head>
<body>
<h1>Upload an image</h1>
<form method="post" action="/upload" enctype="multipart/form-data">
<input type="file" name="file" accept=".webp,.jpg,.jpeg,.png,.gif" required>
<button type="submit">Upload</button>
</form>
<p><a href="/uploads">Uploaded images (JSON)</a></p>
<form method="post" action="/logout"><button type="submit">Sign out</button></form>
</body>
</html>
"#,
    )
}

/// POST /api/upload/auth - issue a direct-upload credential.
async fn upload_auth(
    State(state): State<AppState>,
    payload: Result<Json<UploadAuthRequest>, JsonRejection>,
) -> Result<Json<UploadAuthResponse>, ApiError> {
    let Json(request) = payload?;
    let filename = request.filename.unwrap_or_default();
    validate_filename(&filename)?;

    let object_key = state.keys.generate(&filename);
    let credential = state
        .broker
        .request_upload_credential(&object_key, request.content_sha1.as_deref())
        .await?;

    info!(filename = %filename, object_key = %credential.object_key, "Direct upload authorized");

    Ok(Json(UploadAuthResponse {
        success: true,
        upload_url: credential.upload_url,
        authorization_token: credential.authorization_token,
        object_key: credential.object_key,
        bucket_id: credential.bucket_id,
        headers: credential.headers,
    }))
}

/// POST /api/upload/complete - record a finished direct upload.
async fn upload_complete(
    State(state): State<AppState>,
    payload: Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let Json(request) = payload?;
    let record = state
        .registrar
        .register_completion(
            request.b2_filename.as_deref().unwrap_or_default(),
            request.original_filename.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(CompleteResponse {
        success: true,
        url: record.public_url,
        filename: record.original_filename,
    }))
}

/// GET /uploads - list registered uploads.
async fn list_uploads(State(state): State<AppState>) -> Result<Json<UploadListResponse>, ApiError> {
    let images = state.store.list().await?;
    Ok(Json(UploadListResponse { images }))
}

/// POST /upload - upload through the server (multipart field `file`).
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProxiedUploadResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        validate_filename(&filename)?;
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await?;

        let object_key = state.keys.generate(&filename);
        let record = state
            .registrar
            .store_and_register(&object_key, &filename, bytes, &content_type)
            .await?;

        return Ok(Json(ProxiedUploadResponse {
            success: true,
            message: "File uploaded successfully",
            url: record.public_url,
            filename: record.original_filename,
        }));
    }

    Err(AppError::InvalidInput("no file part".to_string()).into())
}
