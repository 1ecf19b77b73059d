//! Error responses.
//!
//! Every failure leaves the API as
//! `{ "success": false, "error": <message>, "code": <CODE> }` with the
//! status from [`AppError::status_code`].

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use imagegate_core::{metadata::MetadataError, upload::UploadError};
use imagegate_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Handler error wrapping the application error type.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let app = match err {
            UploadError::InvalidInput(msg) => AppError::InvalidInput(msg),
            UploadError::NotVerified(key) => {
                AppError::UploadNotVerified(format!("{key} was not found in storage"))
            }
            UploadError::StorageAuth(cause) => {
                error!(error = %cause, "Storage authorization failed");
                AppError::StorageAuth("could not authorize with object storage".to_string())
            }
            err @ UploadError::CredentialBroker { .. } => {
                error!(error = %err, "Credential broker failed");
                AppError::CredentialBroker("could not obtain an upload credential".to_string())
            }
            UploadError::Storage(cause) => {
                error!(error = %cause, "Storage operation failed");
                if cause.is_unauthorized() {
                    AppError::StorageAuth("object storage rejected the request".to_string())
                } else {
                    AppError::Internal("storage operation failed".to_string())
                }
            }
            UploadError::Store(cause) => return Self::from(cause),
        };
        Self(app)
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        error!(error = %err, "Metadata store failed");
        Self(AppError::StoreUnavailable(
            "metadata store is unavailable".to_string(),
        ))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::InvalidInput(rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(AppError::InvalidInput(rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self(AppError::PayloadTooLarge(err.body_text()))
        } else {
            Self(AppError::InvalidInput(err.body_text()))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_client_error() {
            warn!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }

        let message = match &self.0 {
            AppError::InvalidInput(msg)
            | AppError::UploadNotVerified(msg)
            | AppError::Unauthorized(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::StorageAuth(msg)
            | AppError::CredentialBroker(msg)
            | AppError::StoreUnavailable(msg)
            | AppError::Internal(msg) => msg.clone(),
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
                "code": self.0.error_code(),
            })),
        )
            .into_response()
    }
}
