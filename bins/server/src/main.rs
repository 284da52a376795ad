//! Notara API Server
//!
//! Main entry point for the Notara backend service.

use std::sync::Arc;

use anyhow::bail;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notara_api::{AppState, create_router};
use notara_core::storage::{StorageConfig, StorageProvider, StorageService};
use notara_db::connect_with;
use notara_shared::{AppConfig, JwtConfig, JwtService};
use notara_shared::config::StorageSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notara=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_secs: config.jwt.access_token_expiry_secs as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create storage service, when configured
    let storage = match &config.storage {
        Some(settings) => {
            let service = build_storage(settings)?;
            info!(provider = service.provider_name(), "Storage configured");
            Some(Arc::new(service))
        }
        None => {
            info!("Storage not configured, upload endpoints disabled");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Maps flat storage settings onto a concrete provider.
fn build_storage(settings: &StorageSettings) -> anyhow::Result<StorageService> {
    let require = |value: &Option<String>, name: &str| -> anyhow::Result<String> {
        value.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "storage.{name} is required for provider '{}'",
                settings.provider
            )
        })
    };

    let provider = match settings.provider.as_str() {
        "s3" => StorageProvider::s3(
            require(&settings.endpoint, "endpoint")?,
            require(&settings.bucket, "bucket")?,
            require(&settings.access_key_id, "access_key_id")?,
            require(&settings.secret_access_key, "secret_access_key")?,
            require(&settings.region, "region")?,
        ),
        "azure_blob" => StorageProvider::azure_blob(
            require(&settings.account, "account")?,
            require(&settings.access_key, "access_key")?,
            require(&settings.container, "container")?,
        ),
        "local" => StorageProvider::local_fs(require(&settings.root, "root")?),
        other => bail!("Unknown storage provider '{other}'"),
    };

    let mut storage_config = StorageConfig::new(provider);
    if let Some(size) = settings.max_file_size {
        storage_config = storage_config.with_max_file_size(size);
    }
    if let Some(secs) = settings.upload_ttl_secs {
        storage_config = storage_config.with_upload_ttl(secs);
    }
    if let Some(types) = &settings.allowed_mime_types {
        storage_config = storage_config.with_allowed_mime_types(types.clone());
    }

    Ok(StorageService::from_config(storage_config)?)
}
