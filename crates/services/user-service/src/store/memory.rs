//! In-memory store adapters.
//!
//! Used by tests and by the `memory` backends of the CLI. Contents live
//! for the lifetime of the store value.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{AppError, AppResult};

use super::document::{generate_id, DocumentStore};
use super::object::{key_from_location, object_url, ObjectStore};
use super::query::Query;
use super::value::{Document, Fields};

const MEMORY_URL_SCHEME: &str = "memory://";

/// Document store keeping every collection in a map ordered by id.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory document store");
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let mut id = generate_id();
        while docs.contains_key(&id) {
            id = generate_id();
        }
        docs.insert(id.clone(), fields);

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()));

        Ok(query.apply(docs))
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(AppError::NotFound)?;

        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

/// A stored binary object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Object store keeping payloads in memory under a `memory://` base URL.
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        tracing::info!("Creating new in-memory object store for bucket {}", bucket);
        Self {
            base_url: format!("{}{}", MEMORY_URL_SCHEME, bucket),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a stored object by key
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: String) -> AppResult<()> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), StoredObject { data, content_type });
        Ok(())
    }

    async fn download_url(&self, key: &str) -> AppResult<String> {
        if !self.objects.read().await.contains_key(key) {
            return Err(AppError::NotFound);
        }
        Ok(object_url(&self.base_url, key))
    }

    async fn delete(&self, location: &str) -> AppResult<()> {
        let key = key_from_location(&self.base_url, location)?;
        self.objects
            .write()
            .await
            .remove(&key)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}
