//! Shared configuration structures.

use serde::{Deserialize, Serialize};

/// Database configuration for SQL-backed document stores.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://users.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

/// Object storage configuration for profile pictures.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectStorageConfig {
    /// Directory objects are written under
    pub root_dir: String,
    /// Public base URL download links are built from
    pub public_base_url: String,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            root_dir: "./storage".to_string(),
            public_base_url: "http://localhost:8080/storage".to_string(),
        }
    }
}
