//! Storage configuration types.

use std::time::Duration;

use imagegate_shared::StorageSettings;

/// Connection settings for the B2 native API.
#[derive(Clone)]
pub struct StorageConfig {
    /// Application key ID.
    pub key_id: String,
    /// Application key.
    pub application_key: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Base URL of the account authorization API.
    pub api_url: String,
    /// Public download endpoint.
    pub public_endpoint: String,
    /// Timeout applied to each outbound call.
    pub request_timeout: Duration,
}

impl StorageConfig {
    /// Default authorization API.
    pub const DEFAULT_API_URL: &'static str = "https://api.backblazeb2.com";
    /// Default public download endpoint.
    pub const DEFAULT_PUBLIC_ENDPOINT: &'static str = "https://f004.backblazeb2.com";
    /// Default per-call timeout: 30 seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Create a config with default endpoints.
    #[must_use]
    pub fn new(
        key_id: impl Into<String>,
        application_key: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            application_key: application_key.into(),
            bucket_name: bucket_name.into(),
            api_url: Self::DEFAULT_API_URL.to_string(),
            public_endpoint: Self::DEFAULT_PUBLIC_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Build from the application settings.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(
            &settings.key_id,
            &settings.application_key,
            &settings.bucket_name,
        )
        .with_api_url(&settings.api_url)
        .with_public_endpoint(&settings.public_endpoint)
        .with_request_timeout(Duration::from_secs(settings.request_timeout_secs))
    }

    /// Set the authorization API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the public download endpoint.
    #[must_use]
    pub fn with_public_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.public_endpoint = endpoint.into();
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Public URL builder for this bucket.
    #[must_use]
    pub fn public_urls(&self) -> PublicUrls {
        PublicUrls::new(&self.public_endpoint, &self.bucket_name)
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("api_url", &self.api_url)
            .field("public_endpoint", &self.public_endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Derives the public URL of an object from configuration alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    endpoint: String,
    bucket_name: String,
}

impl PublicUrls {
    /// Create a builder for `bucket_name` behind `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket_name: bucket_name.into(),
        }
    }

    /// `{endpoint}/file/{bucket}/{object_key}`. No I/O.
    #[must_use]
    pub fn url_for(&self, object_key: &str) -> String {
        format!("{}/file/{}/{}", self.endpoint, self.bucket_name, object_key)
    }
}
