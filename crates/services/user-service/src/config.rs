//! User service configuration.

use std::env;
use std::str::FromStr;

use common::{AppError, DatabaseConfig, ObjectStorageConfig};

/// Backend holding user documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentBackend {
    Memory,
    #[default]
    Sql,
}

impl FromStr for DocumentBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(DocumentBackend::Memory),
            "sql" => Ok(DocumentBackend::Sql),
            other => Err(AppError::bad_request(format!("Unknown document backend: {}", other))),
        }
    }
}

/// Backend holding profile pictures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObjectBackend {
    Memory,
    #[default]
    Fs,
}

impl FromStr for ObjectBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(ObjectBackend::Memory),
            "fs" => Ok(ObjectBackend::Fs),
            other => Err(AppError::bad_request(format!("Unknown object backend: {}", other))),
        }
    }
}

/// User service configuration.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    pub document_backend: DocumentBackend,
    pub object_backend: ObjectBackend,
    pub database: DatabaseConfig,
    pub storage: ObjectStorageConfig,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let document_backend = match env::var("USER_SERVICE_DOCUMENT_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.document_backend,
        };
        let object_backend = match env::var("USER_SERVICE_OBJECT_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.object_backend,
        };

        Ok(Self {
            document_backend,
            object_backend,
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: env::var("USER_SERVICE_DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.max_connections),
                min_connections: env::var("USER_SERVICE_DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.database.min_connections),
            },
            storage: ObjectStorageConfig {
                root_dir: env::var("USER_SERVICE_STORAGE_DIR")
                    .unwrap_or(defaults.storage.root_dir),
                public_base_url: env::var("USER_SERVICE_STORAGE_URL")
                    .unwrap_or(defaults.storage.public_base_url),
            },
        })
    }
}
