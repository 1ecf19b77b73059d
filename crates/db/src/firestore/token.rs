//! OAuth access tokens for Firestore from a service-account key.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use imagegate_core::metadata::MetadataError;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A Google service-account JSON key.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Token exchange endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Project the key belongs to.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Key identifier, sent as the JWT `kid`.
    #[serde(default)]
    pub private_key_id: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Uninitialized` if the JSON is not a key.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(json)
            .map_err(|e| MetadataError::Uninitialized(format!("invalid service account key: {e}")))
    }

    /// Read a key file.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Uninitialized` if the file cannot be read or
    /// parsed.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MetadataError::Uninitialized(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .field("private_key", &"[hidden]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

const fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// Exchanges signed assertions for access tokens and caches the result.
pub(crate) struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub(crate) fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, MetadataError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| MetadataError::Uninitialized(format!("invalid private key: {e}")))?;
        Ok(Self {
            key,
            encoding_key,
            http,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, fetching a new one when the cached one is due.
    pub(crate) async fn access_token(&self) -> Result<String, MetadataError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Utc::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, MetadataError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| MetadataError::Uninitialized(format!("failed to sign assertion: {e}")))
    }

    async fn fetch(&self) -> Result<CachedToken, MetadataError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| MetadataError::unavailable(format!("token exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::unavailable(format!(
                "token exchange rejected ({status}): {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::unavailable(format!("unexpected token response: {e}")))?;

        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);
        debug!(expires_in = token.expires_in, "Firestore access token refreshed");

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: now + chrono::Duration::seconds(lifetime),
        })
    }
}

/// Client used for every Firestore call.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, MetadataError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MetadataError::Uninitialized(format!("failed to build HTTP client: {e}")))
}
