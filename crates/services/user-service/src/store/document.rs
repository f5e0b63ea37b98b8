//! Document store port.

use async_trait::async_trait;

use common::AppResult;

use super::query::Query;
use super::value::{Document, Fields};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Document store trait for dependency injection.
///
/// Documents live in named collections and are addressed by an identifier
/// the store assigns on insert.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its newly generated identifier
    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String>;

    /// Fetch a single document by identifier
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Return every document matching the query
    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>>;

    /// Merge the given fields into an existing document.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;
}

/// Generate a fresh document identifier
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
