//! End-to-end router tests with in-process storage and a temp file store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use imagegate_api::{AppState, SessionSettings, create_router};
use imagegate_core::{
    auth::SharedPassword,
    naming::ObjectKeyGenerator,
    storage::{
        AccountAuthorization, BlobProvider, BlobStore, BucketHandle, ObjectStorage, PublicUrls,
        StorageError, UploadTarget,
    },
    upload::{CredentialBroker, FILE_NAME_HEADER, UploadRegistrar},
};
use imagegate_db::FileMetadataStore;
use imagegate_shared::ChecksumMode;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery staple";
const MAX_UPLOAD_BYTES: usize = 1024;

/// Hands out upload URLs unless `fail_upload_urls` is set, in which case
/// both the primary and fallback paths fail.
#[derive(Default)]
struct FakeStorage {
    fail_upload_urls: bool,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn authorize_bucket(&self) -> Result<BucketHandle, StorageError> {
        Ok(BucketHandle {
            bucket_id: "bucket-1".into(),
            bucket_name: "images".into(),
            api_url: "https://api000.backblazeb2.com".into(),
            authorization_token: "account-token".into(),
        })
    }

    async fn get_upload_url(&self, _bucket: &BucketHandle) -> Result<UploadTarget, StorageError> {
        if self.fail_upload_urls {
            return Err(StorageError::Transport("pod-000 unreachable".into()));
        }
        Ok(UploadTarget {
            upload_url: "https://pod-000.backblaze.com/b2api/v2/b2_upload_file/bucket-1/c0".into(),
            authorization_token: "upload-token".into(),
        })
    }

    async fn account_authorization(&self) -> Result<AccountAuthorization, StorageError> {
        Err(StorageError::Transport("api000 unreachable".into()))
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_storage(FakeStorage::default()).await
    }

    async fn with_storage(storage: FakeStorage) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            FileMetadataStore::open(dir.path().join("uploaded_images.json"))
                .await
                .unwrap(),
        );
        let blobs = Arc::new(BlobStore::from_provider(&BlobProvider::Memory).unwrap());
        let urls = PublicUrls::new("https://f004.backblazeb2.com", "images");

        let state = AppState {
            broker: Arc::new(CredentialBroker::new(Arc::new(storage), ChecksumMode::Verify)),
            registrar: Arc::new(UploadRegistrar::new(store.clone(), urls).with_blob_store(blobs)),
            store,
            keys: Arc::new(ObjectKeyGenerator::new("products/")),
            password: Arc::new(SharedPassword::from_plain(PASSWORD).unwrap()),
            session: SessionSettings::from_secret(&[42u8; 64], Duration::from_secs(3600), false)
                .unwrap(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };

        Self {
            router: create_router(state),
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self) -> String {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!(
                        "password={}",
                        PASSWORD.replace(' ', "+")
                    )))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn post_json(&self, uri: &str, cookie: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart(filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "imagegate-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let response = app.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["metadata_backend"], "file");
}

#[tokio::test]
async fn test_protected_routes_redirect_to_login() {
    let app = TestApp::new().await;

    for uri in ["/uploads", "/"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    let response = app
        .post_json("/api/upload/auth", "", json!({ "filename": "a.png" }))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .get("/uploads", Some("imagegate_session=1700000000"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_wrong_password() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("password=nope"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_page_renders() {
    let app = TestApp::new().await;
    let response = app.get("/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_direct_upload_handshake() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app
        .post_json("/api/upload/auth", &cookie, json!({ "filename": "photo.PNG" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let credential = json_body(response).await;

    assert_eq!(credential["success"], true);
    assert_eq!(credential["authorization_token"], "upload-token");
    assert_eq!(credential["bucket_id"], "bucket-1");
    let object_key = credential["objectKey"].as_str().unwrap().to_string();
    assert!(object_key.starts_with("products/photo-"));
    assert!(object_key.ends_with(".png"));
    assert_eq!(credential["headers"][FILE_NAME_HEADER], object_key.as_str());

    let response = app
        .post_json(
            "/api/upload/complete",
            &cookie,
            json!({ "b2_filename": object_key, "original_filename": "photo.PNG" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let completed = json_body(response).await;
    assert_eq!(completed["filename"], "photo.PNG");
    assert_eq!(
        completed["url"],
        format!("https://f004.backblazeb2.com/file/images/{object_key}")
    );

    let listing = json_body(app.get("/uploads", Some(&cookie)).await).await;
    let images = listing["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["b2_filename"], object_key.as_str());
    assert_eq!(images[0]["filename"], "photo.PNG");
}

#[tokio::test]
async fn test_upload_auth_rejects_bad_input() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    for body in [
        json!({}),
        json!({ "filename": "" }),
        json!({ "filename": "notes.pdf" }),
        json!({ "filename": "a.png", "content_sha1": "xyz" }),
    ] {
        let response = app.post_json("/api/upload/auth", &cookie, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = json_body(response).await;
        assert_eq!(error["success"], false);
        assert_eq!(error["code"], "INVALID_INPUT");
    }
}

#[tokio::test]
async fn test_upload_auth_storage_failure_is_server_error() {
    let app = TestApp::with_storage(FakeStorage {
        fail_upload_urls: true,
    })
    .await;
    let cookie = app.login().await;

    let response = app
        .post_json("/api/upload/auth", &cookie, json!({ "filename": "a.png" }))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = json_body(response).await;
    assert_eq!(error["success"], false);
    assert_eq!(error["code"], "CREDENTIAL_BROKER_ERROR");
    let message = error["error"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(!message.contains("unreachable"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/upload/auth")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ filename: "))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_requires_both_fields() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app
        .post_json(
            "/api/upload/complete",
            &cookie,
            json!({ "original_filename": "a.png" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listing = json_body(app.get("/uploads", Some(&cookie)).await).await;
    assert_eq!(listing["images"], json!([]));
}

#[tokio::test]
async fn test_proxied_upload() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let (content_type, body) = multipart("cat.png", b"\x89PNG\r\n\x1a\n");
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = json_body(response).await;
    assert_eq!(uploaded["success"], true);
    assert_eq!(uploaded["filename"], "cat.png");
    assert!(
        uploaded["url"]
            .as_str()
            .unwrap()
            .starts_with("https://f004.backblazeb2.com/file/images/products/cat-")
    );
}

#[tokio::test]
async fn test_proxied_upload_rejects_disallowed_type() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let (content_type, body) = multipart("script.exe", b"MZ");
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_proxied_upload_over_limit() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let (content_type, body) = multipart("big.png", &vec![0u8; MAX_UPLOAD_BYTES * 2]);
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("imagegate_session="));
}
