//! Configuration module
//!
//! This module provides configuration structures for the import service:
//! server settings, the persistence/storage/notifier backend selection and
//! the transaction lifecycle timings.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{
    HANDLER_TIMEOUT_SECS, NOTIFIER_TIMEOUT_SECS, TRANSACTION_PURGE_INTERVAL_SECS,
    TRANSACTION_TTL_SECS, UPLOAD_URL_EXPIRES_SECS,
};
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SERVER_PORT: u16 = 3000;

/// Transaction / invoice store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid store backend: {}", s)),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Connection notifier backend
///
/// `Http` talks to the management API of an external WebSocket gateway,
/// `Local` pushes to sockets held by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierBackend {
    Http,
    Local,
}

impl FromStr for NotifierBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(NotifierBackend::Http),
            "local" => Ok(NotifierBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid notifier backend: {}", s)),
        }
    }
}

impl Display for NotifierBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NotifierBackend::Http => write!(f, "http"),
            NotifierBackend::Local => write!(f, "local"),
        }
    }
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
        }
    }
}

/// Import service configuration
#[derive(Clone, Debug)]
pub struct ImportServiceConfig {
    pub base: BaseConfig,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, LocalStack)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Client connections
    pub notifier_backend: NotifierBackend,
    pub notifier_endpoint: Option<String>,
    pub notifier_timeout_secs: u64,
    // Transaction lifecycle
    pub handler_timeout_secs: u64,
    pub upload_url_expires_secs: u64,
    pub transaction_ttl_secs: i64,
    /// Interval between purges of expired transactions. 0 = disabled.
    pub transaction_purge_interval_secs: u64,
}

impl Default for ImportServiceConfig {
    /// In-process backends everywhere; suitable for tests and local runs.
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            storage_backend: StorageBackend::Memory,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            notifier_backend: NotifierBackend::Local,
            notifier_endpoint: None,
            notifier_timeout_secs: NOTIFIER_TIMEOUT_SECS,
            handler_timeout_secs: HANDLER_TIMEOUT_SECS,
            upload_url_expires_secs: UPLOAD_URL_EXPIRES_SECS,
            transaction_ttl_secs: TRANSACTION_TTL_SECS,
            transaction_purge_interval_secs: TRANSACTION_PURGE_INTERVAL_SECS,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config(pub Box<ImportServiceConfig>);

impl Config {
    fn as_service(&self) -> &ImportServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ImportServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().base.db_timeout_seconds
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.as_service().store_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_service().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_service().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_service().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_service().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_service().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_service().local_storage_base_url.as_deref()
    }

    pub fn notifier_backend(&self) -> NotifierBackend {
        self.as_service().notifier_backend
    }

    pub fn notifier_endpoint(&self) -> Option<&str> {
        self.as_service().notifier_endpoint.as_deref()
    }

    pub fn notifier_timeout_secs(&self) -> u64 {
        self.as_service().notifier_timeout_secs
    }

    pub fn handler_timeout_secs(&self) -> u64 {
        self.as_service().handler_timeout_secs
    }

    pub fn upload_url_expires_secs(&self) -> u64 {
        self.as_service().upload_url_expires_secs
    }

    pub fn transaction_ttl_secs(&self) -> i64 {
        self.as_service().transaction_ttl_secs
    }

    pub fn transaction_purge_interval_secs(&self) -> u64 {
        self.as_service().transaction_purge_interval_secs
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Normalize a gateway endpoint to the https management base URL.
///
/// Gateways are usually configured with their client-facing `wss://` URL;
/// the management API lives on the same host over https.
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let host_and_path = trimmed
        .strip_prefix("wss://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    format!("https://{}", host_and_path)
}

impl ImportServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => StoreBackend::Postgres,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let notifier_backend = match env::var("NOTIFIER_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => NotifierBackend::Local,
        };

        let config = ImportServiceConfig {
            base,
            store_backend,
            database_url: env::var("DATABASE_URL").ok(),
            storage_backend,
            s3_bucket: env::var("BUCKET_NAME")
                .or_else(|_| env::var("S3_BUCKET"))
                .ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            notifier_backend,
            notifier_endpoint: env::var("INVOICE_WSAPI_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| normalize_endpoint(&s)),
            notifier_timeout_secs: env::var("NOTIFIER_TIMEOUT_SECS")
                .unwrap_or_else(|_| NOTIFIER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(NOTIFIER_TIMEOUT_SECS),
            handler_timeout_secs: env::var("HANDLER_TIMEOUT_SECS")
                .unwrap_or_else(|_| HANDLER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(HANDLER_TIMEOUT_SECS),
            upload_url_expires_secs: env::var("UPLOAD_URL_EXPIRES_SECS")
                .unwrap_or_else(|_| UPLOAD_URL_EXPIRES_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_URL_EXPIRES_SECS),
            transaction_ttl_secs: env::var("TRANSACTION_TTL_SECS")
                .unwrap_or_else(|_| TRANSACTION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(TRANSACTION_TTL_SECS),
            transaction_purge_interval_secs: env::var("TRANSACTION_PURGE_INTERVAL_SECS")
                .unwrap_or_else(|_| TRANSACTION_PURGE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(TRANSACTION_PURGE_INTERVAL_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.store_backend == StoreBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when STORE_BACKEND=postgres"
                    ))
                }
                Some(url) if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                Some(_) => {}
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "BUCKET_NAME or S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        if self.notifier_backend == NotifierBackend::Http && self.notifier_endpoint.is_none() {
            return Err(anyhow::anyhow!(
                "INVOICE_WSAPI_ENDPOINT must be set when NOTIFIER_BACKEND=http"
            ));
        }

        if self.handler_timeout_secs == 0 {
            return Err(anyhow::anyhow!("HANDLER_TIMEOUT_SECS must be greater than 0"));
        }
        if self.notifier_timeout_secs == 0 || self.notifier_timeout_secs >= self.handler_timeout_secs
        {
            return Err(anyhow::anyhow!(
                "NOTIFIER_TIMEOUT_SECS must be greater than 0 and below HANDLER_TIMEOUT_SECS"
            ));
        }
        if self.upload_url_expires_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_URL_EXPIRES_SECS must be greater than 0"
            ));
        }
        if self.transaction_ttl_secs <= 0 {
            return Err(anyhow::anyhow!("TRANSACTION_TTL_SECS must be greater than 0"));
        }

        Ok(())
    }
}
