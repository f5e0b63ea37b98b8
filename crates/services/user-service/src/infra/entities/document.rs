//! Stored document entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::store::{Document, Fields};
use common::AppResult;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// JSON-encoded field map
    #[sea_orm(column_type = "Text")]
    pub data: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored field map
    pub fn fields(&self) -> AppResult<Fields> {
        Ok(serde_json::from_str(&self.data)?)
    }

    /// Convert into a store document
    pub fn into_document(self) -> AppResult<Document> {
        let fields = self.fields()?;
        Ok(Document::new(self.id, fields))
    }
}
