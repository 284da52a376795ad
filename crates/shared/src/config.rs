//! Layered runtime configuration: `config/` files, then `NOTARA__*`
//! environment variables on top.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Database connection and pool settings.
    pub database: DatabaseConfig,
    /// Token signing settings.
    pub jwt: JwtConfig,
    /// Object storage configuration. Absent disables the upload endpoints.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address, `0.0.0.0` by default.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listener port, 8080 by default.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database connection and pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Upper bound for the connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open when idle.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Token signing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret for signing and validating tokens.
    pub secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    28800 // 8 hours, one working day
}

/// Object storage settings, mapped onto a concrete provider at startup.
///
/// Only the fields for the chosen provider need to be present: `endpoint`,
/// `bucket`, `access_key_id`, `secret_access_key`, `region` for `s3`;
/// `account`, `access_key`, `container` for `azure_blob`; `root` for
/// `local`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider kind: `s3`, `azure_blob`, or `local`.
    pub provider: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// S3 access key id.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub region: Option<String>,
    /// Azure storage account name.
    #[serde(default)]
    pub account: Option<String>,
    /// Azure storage access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Azure container name.
    #[serde(default)]
    pub container: Option<String>,
    /// Local filesystem root.
    #[serde(default)]
    pub root: Option<String>,
    /// Maximum upload size in bytes, provider default when absent.
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Presigned upload URL lifetime in seconds, provider default when
    /// absent.
    #[serde(default)]
    pub upload_ttl_secs: Option<u64>,
    /// Overrides the accepted MIME types for uploads.
    #[serde(default)]
    pub allowed_mime_types: Option<Vec<String>>,
}

impl AppConfig {
    /// Loads configuration, layering `config/default`, then
    /// `config/{RUN_MODE}`, then `NOTARA__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when a source fails to parse
    /// or a required field such as `database.url` is missing.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("NOTARA").separator("__"))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))
    }
}
