//! SQL-backed document store.
//!
//! Documents of every collection share one `documents` table; each row
//! holds the JSON-encoded field map. SQL has no native ordering over the
//! mixed-kind field values, so predicates and ordering are evaluated
//! client-side over the rows of the queried collection.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use common::{AppError, AppResult};

use super::entities::document::{self, ActiveModel, Entity as DocumentEntity};
use crate::store::{generate_id, Document, DocumentStore, Fields, Query};

/// Concrete implementation of DocumentStore over SeaORM
pub struct SqlDocumentStore {
    db: DatabaseConnection,
}

impl SqlDocumentStore {
    /// Create new store instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, collection: &str, id: &str) -> AppResult<Option<document::Model>> {
        DocumentEntity::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await
            .map_err(AppError::from)
    }
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String> {
        let id = generate_id();
        let active_model = ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.clone()),
            data: Set(serde_json::to_string(&fields)?),
        };

        DocumentEntity::insert(active_model)
            .exec_without_returning(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.find(collection, id)
            .await?
            .map(document::Model::into_document)
            .transpose()
    }

    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>> {
        let models = DocumentEntity::find()
            .filter(document::Column::Collection.eq(collection))
            .order_by_asc(document::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        let docs = models
            .into_iter()
            .map(document::Model::into_document)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(query.apply(docs))
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        let model = self.find(collection, id).await?.ok_or(AppError::NotFound)?;

        let mut merged = model.fields()?;
        merged.extend(fields);

        let mut active: ActiveModel = model.into();
        active.data = Set(serde_json::to_string(&merged)?);
        active.update(&self.db).await.map_err(AppError::from)?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        DocumentEntity::delete_by_id((collection.to_string(), id.to_string()))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
