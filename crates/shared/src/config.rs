//! Application configuration management.

use serde::Deserialize;
use thiserror::Error;

/// Minimum length of the cookie signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Login gate configuration.
    pub auth: AuthConfig,
    /// Object storage (Backblaze B2) configuration.
    pub storage: StorageSettings,
    /// Upload metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest request body accepted by the proxied upload route.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Login gate configuration.
///
/// Exactly one shared password protects the whole gateway. It can be given
/// in plain text (hashed once at startup) or as an Argon2 PHC string.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared password in plain text.
    #[serde(default)]
    pub password: Option<String>,
    /// Shared password as an Argon2 PHC hash.
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Secret used to sign session cookies.
    pub session_secret: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_ttl() -> u64 {
    86_400 // 24 hours
}

/// How the direct-upload checksum header is filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumMode {
    /// The backend verifies the SHA-1 of the uploaded bytes.
    #[default]
    Verify,
    /// The backend is told not to verify.
    Skip,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Application key ID.
    pub key_id: String,
    /// Application key.
    pub application_key: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Bucket ID. Resolved at startup when absent.
    #[serde(default)]
    pub bucket_id: Option<String>,
    /// Base URL of the account authorization API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Public download endpoint used to build record URLs.
    #[serde(default = "default_public_endpoint")]
    pub public_endpoint: String,
    /// Prefix prepended to every generated object key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Checksum handling for direct uploads.
    #[serde(default)]
    pub checksum: ChecksumMode,
    /// Confirm the object exists before registering a completed upload.
    #[serde(default)]
    pub verify_on_complete: bool,
    /// Timeout for each outbound storage call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.backblazeb2.com".to_string()
}

fn default_public_endpoint() -> String {
    "https://f004.backblazeb2.com".to_string()
}

fn default_key_prefix() -> String {
    "products/".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Which metadata store implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataBackend {
    /// Flat JSON file on local disk.
    #[default]
    File,
    /// Google Cloud Firestore.
    Firestore,
}

/// Upload metadata store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: MetadataBackend,
    /// Path of the JSON file used by the file backend.
    #[serde(default = "default_file_path")]
    pub file_path: String,
    /// Firestore settings, required by the firestore backend.
    #[serde(default)]
    pub firestore: Option<FirestoreConfig>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::default(),
            file_path: default_file_path(),
            firestore: None,
        }
    }
}

fn default_file_path() -> String {
    "data/uploaded_images.json".to_string()
}

/// Firestore configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    /// Project ID. Taken from the service account when absent.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Path to a service-account JSON key file.
    #[serde(default)]
    pub credentials_path: Option<String>,
    /// Inline service-account JSON key.
    #[serde(default)]
    pub credentials_json: Option<String>,
    /// Collection holding upload documents.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// REST API base URL.
    #[serde(default = "default_firestore_url")]
    pub base_url: String,
    /// Talk to the Firestore emulator: no credentials, no token exchange.
    #[serde(default)]
    pub emulator: bool,
}

fn default_collection() -> String {
    "uploads".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

/// A configuration value that is missing or unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required setting is missing or blank.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Environment variables use the `IMAGEGATE` prefix with `__` between
    /// sections, e.g. `IMAGEGATE__STORAGE__BUCKET_NAME`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("IMAGEGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Checks the settings that deserialization alone cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        require("storage.key_id", &self.storage.key_id)?;
        require("storage.application_key", &self.storage.application_key)?;
        require("storage.bucket_name", &self.storage.bucket_name)?;
        require("storage.public_endpoint", &self.storage.public_endpoint)?;
        require("storage.api_url", &self.storage.api_url)?;

        let has_password = self
            .auth
            .password
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let has_hash = self
            .auth
            .password_hash
            .as_deref()
            .is_some_and(|h| !h.trim().is_empty());
        if !has_password && !has_hash {
            return Err(ConfigValidationError::Missing("auth.password"));
        }

        if self.auth.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigValidationError::Invalid {
                field: "auth.session_secret",
                reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
            });
        }

        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigValidationError::Invalid {
                field: "auth.session_ttl_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        match self.metadata.backend {
            MetadataBackend::File => require("metadata.file_path", &self.metadata.file_path)?,
            MetadataBackend::Firestore => {
                let fs = self
                    .metadata
                    .firestore
                    .as_ref()
                    .ok_or(ConfigValidationError::Missing("metadata.firestore"))?;
                require("metadata.firestore.collection", &fs.collection)?;
                if !fs.emulator && fs.credentials_path.is_none() && fs.credentials_json.is_none() {
                    return Err(ConfigValidationError::Missing(
                        "metadata.firestore.credentials_path",
                    ));
                }
                if fs.emulator && fs.project_id.is_none() {
                    return Err(ConfigValidationError::Missing(
                        "metadata.firestore.project_id",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigValidationError> {
    if value.trim().is_empty() {
        Err(ConfigValidationError::Missing(field))
    } else {
        Ok(())
    }
}
