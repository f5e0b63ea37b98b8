//! User Service Library
//!
//! Data-access layer for user records: a document collection holding the
//! records and an object store holding profile pictures. Both stores are
//! injected into [`service::UserManager`], so tests and callers choose
//! the backends.

pub mod config;
pub mod infra;
pub mod service;
pub mod store;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use common::AppResult;

use crate::config::{DocumentBackend, ObjectBackend, UserServiceConfig};
use crate::infra::{Database, FsObjectStore, SqlDocumentStore};
use crate::service::{UserManager, UserService};
use crate::store::{DocumentStore, MemoryDocumentStore, MemoryObjectStore, ObjectStore};

const MEMORY_BUCKET: &str = "local";
const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter from `RUST_LOG`, loading `.env` first so it can set the level.
pub fn log_filter() -> EnvFilter {
    dotenvy::dotenv().ok();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Build a user service wired to the configured backends.
///
/// The SQL backend connects and applies pending migrations first.
pub async fn build_service(config: &UserServiceConfig) -> AppResult<Arc<dyn UserService>> {
    let documents: Arc<dyn DocumentStore> = match config.document_backend {
        DocumentBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        DocumentBackend::Sql => {
            let db = Database::connect(&config.database).await?;
            Arc::new(SqlDocumentStore::new(db.get_connection()))
        }
    };

    let objects: Arc<dyn ObjectStore> = match config.object_backend {
        ObjectBackend::Memory => Arc::new(MemoryObjectStore::new(MEMORY_BUCKET)),
        ObjectBackend::Fs => Arc::new(FsObjectStore::from_config(&config.storage)),
    };

    info!(
        documents = ?config.document_backend,
        objects = ?config.object_backend,
        "User service initialized"
    );

    Ok(Arc::new(UserManager::new(documents, objects)))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(config: &UserServiceConfig, action: MigrateAction) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
