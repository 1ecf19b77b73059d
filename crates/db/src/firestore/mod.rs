//! Firestore document store over the REST API.
//!
//! Each record is one document in the configured collection. The document
//! id is the URL-safe base64 of the object key, so keys containing `/` stay
//! a single path segment.

mod token;
mod value;

pub use token::ServiceAccountKey;

use std::time::Duration;

use async_trait::async_trait;
use imagegate_core::metadata::{
    MetadataError, MetadataStore, UploadRecord, normalize_record, sort_newest_first,
};
use imagegate_shared::FirestoreConfig;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use token::{TokenSource, http_client};
use value::{decode_fields, encode_record};

const PAGE_SIZE: u32 = 300;

#[derive(Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Metadata store backed by a Firestore collection.
pub struct FirestoreMetadataStore {
    http: reqwest::Client,
    collection_url: String,
    tokens: Option<TokenSource>,
}

impl FirestoreMetadataStore {
    /// Connect using `config` and obtain a first access token.
    ///
    /// In emulator mode no credentials are read and no token is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are missing or invalid, the
    /// project cannot be determined, or the token exchange fails.
    pub async fn connect(
        config: &FirestoreConfig,
        request_timeout: Duration,
    ) -> Result<Self, MetadataError> {
        let http = http_client(request_timeout)?;

        let (project_id, tokens) = if config.emulator {
            let project_id = config.project_id.clone().ok_or_else(|| {
                MetadataError::Uninitialized("project_id is required in emulator mode".into())
            })?;
            (project_id, None)
        } else {
            let key = match (&config.credentials_json, &config.credentials_path) {
                (Some(json), _) => ServiceAccountKey::from_json(json)?,
                (None, Some(path)) => ServiceAccountKey::from_file(path).await?,
                (None, None) => {
                    return Err(MetadataError::Uninitialized(
                        "no service account credentials configured".into(),
                    ));
                }
            };
            let project_id = config
                .project_id
                .clone()
                .or_else(|| key.project_id.clone())
                .ok_or_else(|| MetadataError::Uninitialized("project_id is unknown".into()))?;
            (project_id, Some(TokenSource::new(key, http.clone())?))
        };

        if let Some(tokens) = &tokens {
            tokens.access_token().await?;
        }

        let collection_url = format!(
            "{}/v1/projects/{project_id}/databases/(default)/documents/{}",
            config.base_url.trim_end_matches('/'),
            config.collection
        );
        info!(
            project_id = %project_id,
            collection = %config.collection,
            emulator = config.emulator,
            "Connected to Firestore"
        );

        Ok(Self {
            http,
            collection_url,
            tokens,
        })
    }

    /// Document id for `object_key`.
    #[must_use]
    pub fn document_id(object_key: &str) -> String {
        base64_url::encode(object_key)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, MetadataError> {
        Ok(match &self.tokens {
            Some(tokens) => request.bearer_auth(tokens.access_token().await?),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MetadataError> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| MetadataError::unavailable(format!("firestore unreachable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                MetadataError::unavailable(format!("firestore rejected credentials ({status})"))
            }
            _ => MetadataError::unavailable(format!("firestore error ({status}): {body}")),
        })
    }
}

impl std::fmt::Debug for FirestoreMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreMetadataStore")
            .field("collection_url", &self.collection_url)
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataStore for FirestoreMetadataStore {
    async fn put(&self, record: &UploadRecord) -> Result<(), MetadataError> {
        let url = format!(
            "{}/{}",
            self.collection_url,
            Self::document_id(&record.object_key)
        );
        let body = json!({ "fields": encode_record(record) });

        self.send(self.http.patch(&url).json(&body)).await?;
        debug!(object_key = %record.object_key, "Record written to Firestore");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UploadRecord>, MetadataError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&self.collection_url)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsResponse = self
                .send(request)
                .await?
                .json()
                .await
                .map_err(|e| MetadataError::corrupt(format!("unexpected list response: {e}")))?;

            records.extend(page.documents.iter().map(|doc| {
                // Documents written here always carry their key; anything
                // without one keeps its raw id.
                let doc_id = doc.name.rsplit('/').next().unwrap_or_default();
                normalize_record(&decode_fields(&doc.fields), doc_id)
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        sort_newest_first(&mut records);
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}
