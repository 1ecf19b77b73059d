//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing request fields.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The client's claim about an upload could not be confirmed.
    #[error("Upload not verified: {0}")]
    UploadNotVerified(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Request body exceeds the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Cannot reach or authenticate to object storage.
    #[error("Storage authorization failed: {0}")]
    StorageAuth(String),

    /// No upload credential could be issued.
    #[error("Upload credential unavailable: {0}")]
    CredentialBroker(String),

    /// Metadata store unreachable or uninitialized.
    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::UploadNotVerified(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PayloadTooLarge(_) => 413,
            Self::StorageAuth(_)
            | Self::CredentialBroker(_)
            | Self::StoreUnavailable(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UploadNotVerified(_) => "UPLOAD_NOT_VERIFIED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::StorageAuth(_) => "STORAGE_AUTH_ERROR",
            Self::CredentialBroker(_) => "CREDENTIAL_BROKER_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::InvalidInput(String::new()), 400, "INVALID_INPUT")]
    #[case(AppError::UploadNotVerified(String::new()), 400, "UPLOAD_NOT_VERIFIED")]
    #[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
    #[case(AppError::PayloadTooLarge(String::new()), 413, "PAYLOAD_TOO_LARGE")]
    #[case(AppError::StorageAuth(String::new()), 500, "STORAGE_AUTH_ERROR")]
    #[case(AppError::CredentialBroker(String::new()), 500, "CREDENTIAL_BROKER_ERROR")]
    #[case(AppError::StoreUnavailable(String::new()), 500, "STORE_UNAVAILABLE")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_error_status_and_code(
        #[case] error: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::InvalidInput("msg".into()).to_string(),
            "Invalid input: msg"
        );
        assert_eq!(
            AppError::CredentialBroker("msg".into()).to_string(),
            "Upload credential unavailable: msg"
        );
        assert_eq!(
            AppError::StoreUnavailable("msg".into()).to_string(),
            "Metadata store unavailable: msg"
        );
    }
}
