//! Infrastructure layer - SQL and filesystem store adapters.

mod db;
pub mod entities;
mod fs_store;
pub mod migrations;
mod sql_store;

pub use db::Database;
pub use fs_store::FsObjectStore;
pub use migrations::Migrator;
pub use sql_store::SqlDocumentStore;
