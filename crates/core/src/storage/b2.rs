//! Backblaze B2 native API client.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{AccountAuthorization, BucketHandle, ObjectStorage, UploadTarget};
use super::config::StorageConfig;
use super::error::StorageError;

const AUTHORIZE_ACCOUNT_PATH: &str = "b2api/v2/b2_authorize_account";
const LIST_BUCKETS_PATH: &str = "b2api/v2/b2_list_buckets";
const GET_UPLOAD_URL_PATH: &str = "b2api/v2/b2_get_upload_url";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeAccountResponse {
    account_id: String,
    authorization_token: String,
    api_url: String,
    #[serde(default)]
    download_url: String,
    #[serde(default)]
    allowed: Option<AllowedScope>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllowedScope {
    #[serde(default)]
    bucket_id: Option<String>,
    #[serde(default)]
    bucket_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListBucketsRequest<'a> {
    account_id: &'a str,
    bucket_name: &'a str,
}

#[derive(Deserialize)]
struct ListBucketsResponse {
    buckets: Vec<BucketInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketInfo {
    bucket_id: String,
    bucket_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetUploadUrlRequest<'a> {
    bucket_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetUploadUrlResponse {
    upload_url: String,
    authorization_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// [`ObjectStorage`] over the B2 native API.
#[derive(Debug, Clone)]
pub struct B2Client {
    http: Client,
    config: StorageConfig,
}

impl B2Client {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Public download URL of `object_key`. No I/O.
    #[must_use]
    pub fn public_url(&self, object_key: &str) -> String {
        self.config.public_urls().url_for(object_key)
    }

    async fn authorize(&self) -> Result<AuthorizeAccountResponse, StorageError> {
        let response = self
            .http
            .get(endpoint(&self.config.api_url, AUTHORIZE_ACCOUNT_PATH))
            .basic_auth(&self.config.key_id, Some(&self.config.application_key))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn resolve_bucket_id(
        &self,
        auth: &AuthorizeAccountResponse,
    ) -> Result<String, StorageError> {
        let name = self.config.bucket_name.as_str();

        // Keys restricted to a single bucket already name it.
        if let Some(AllowedScope {
            bucket_id: Some(id),
            bucket_name: Some(allowed_name),
        }) = &auth.allowed
            && allowed_name == name
        {
            return Ok(id.clone());
        }

        let response = self
            .http
            .post(endpoint(&auth.api_url, LIST_BUCKETS_PATH))
            .header(reqwest::header::AUTHORIZATION, &auth.authorization_token)
            .json(&ListBucketsRequest {
                account_id: &auth.account_id,
                bucket_name: name,
            })
            .send()
            .await?;

        let listing: ListBucketsResponse = check(response).await?.json().await?;
        listing
            .buckets
            .into_iter()
            .find(|b| b.bucket_name == name)
            .map(|b| b.bucket_id)
            .ok_or_else(|| StorageError::BucketNotFound(name.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for B2Client {
    async fn authorize_bucket(&self) -> Result<BucketHandle, StorageError> {
        let auth = self.authorize().await?;
        let bucket_id = self.resolve_bucket_id(&auth).await?;

        debug!(bucket_id = %bucket_id, bucket = %self.config.bucket_name, "Bucket authorized");

        Ok(BucketHandle {
            bucket_id,
            bucket_name: self.config.bucket_name.clone(),
            api_url: auth.api_url,
            authorization_token: auth.authorization_token,
        })
    }

    async fn get_upload_url(&self, bucket: &BucketHandle) -> Result<UploadTarget, StorageError> {
        let response = self
            .http
            .post(endpoint(&bucket.api_url, GET_UPLOAD_URL_PATH))
            .header(reqwest::header::AUTHORIZATION, &bucket.authorization_token)
            .json(&GetUploadUrlRequest {
                bucket_id: &bucket.bucket_id,
            })
            .send()
            .await?;

        let body: GetUploadUrlResponse = check(response).await?.json().await?;
        Ok(UploadTarget {
            upload_url: body.upload_url,
            authorization_token: body.authorization_token,
        })
    }

    async fn account_authorization(&self) -> Result<AccountAuthorization, StorageError> {
        let auth = self.authorize().await?;
        Ok(AccountAuthorization {
            account_id: auth.account_id,
            api_url: auth.api_url,
            authorization_token: auth.authorization_token,
            download_url: auth.download_url,
        })
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

/// Turn a non-success response into a `StorageError`.
async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        let reason = if body.message.is_empty() {
            body.code
        } else {
            body.message
        };
        return Err(StorageError::Unauthorized(reason));
    }

    Err(StorageError::Api {
        status: status.as_u16(),
        code: body.code,
        message: body.message,
    })
}
