//! imagegate server
//!
//! Main entry point: loads configuration, builds the storage and metadata
//! clients once, and serves the router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagegate_api::{AppState, SessionSettings, create_router};
use imagegate_core::{
    auth::SharedPassword,
    naming::ObjectKeyGenerator,
    storage::{B2Client, BlobProvider, BlobStore, ObjectStorage, StorageConfig},
    upload::{CredentialBroker, UploadRegistrar},
};
use imagegate_db::open_store;
use imagegate_shared::{AppConfig, AuthConfig, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let storage_config = StorageConfig::from_settings(&config.storage);
    let b2 = Arc::new(B2Client::new(storage_config.clone())?);
    info!(
        bucket = %config.storage.bucket_name,
        checksum = ?config.storage.checksum,
        "Object storage configured"
    );

    let blobs = open_blob_store(&config.storage, &b2).await;

    let store = open_store(&config.metadata, storage_config.request_timeout)
        .await
        .context("failed to initialize metadata store")?;

    let mut registrar = UploadRegistrar::new(store.clone(), storage_config.public_urls())
        .with_verification(config.storage.verify_on_complete);
    if let Some(blobs) = blobs {
        registrar = registrar.with_blob_store(blobs);
    }
    if !registrar.has_blob_store() && config.storage.verify_on_complete {
        warn!("Upload verification requested but no blob store is available, completions will fail");
    }

    let state = AppState {
        broker: Arc::new(CredentialBroker::new(b2, config.storage.checksum)),
        registrar: Arc::new(registrar),
        store,
        keys: Arc::new(ObjectKeyGenerator::new(&config.storage.key_prefix)),
        password: Arc::new(shared_password(&config.auth)?),
        session: SessionSettings::from_secret(
            config.auth.session_secret.as_bytes(),
            Duration::from_secs(config.auth.session_ttl_secs),
            config.auth.secure_cookie,
        )?,
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` filters, `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "imagegate=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn shared_password(auth: &AuthConfig) -> anyhow::Result<SharedPassword> {
    let password = match (&auth.password_hash, &auth.password) {
        (Some(hash), _) if !hash.trim().is_empty() => SharedPassword::from_hash(hash.trim())?,
        (_, Some(plain)) => SharedPassword::from_plain(plain)?,
        _ => anyhow::bail!("no login password configured"),
    };
    Ok(password)
}

/// Blob store for proxied uploads and existence checks.
///
/// Needs the bucket id; when it is not configured it is resolved once here.
/// Failing that, the server still runs with direct uploads only.
async fn open_blob_store(settings: &StorageSettings, b2: &B2Client) -> Option<Arc<BlobStore>> {
    let bucket_id = match &settings.bucket_id {
        Some(id) if !id.trim().is_empty() => id.clone(),
        _ => match b2.authorize_bucket().await {
            Ok(bucket) => bucket.bucket_id,
            Err(e) => {
                warn!(error = %e, "Could not resolve bucket id, proxied uploads disabled");
                return None;
            }
        },
    };

    let provider = BlobProvider::B2 {
        key_id: settings.key_id.clone(),
        application_key: settings.application_key.clone(),
        bucket_name: settings.bucket_name.clone(),
        bucket_id,
    };
    match BlobStore::from_provider(&provider) {
        Ok(store) => {
            info!(provider = store.provider_name(), "Blob store ready");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(error = %e, "Blob store unavailable, proxied uploads disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
