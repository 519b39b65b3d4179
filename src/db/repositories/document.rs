use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::documents;

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub file_name: String,
    pub storage_path: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_by: i32,
}

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new_document: NewDocument) -> Result<documents::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = documents::ActiveModel {
            file_name: Set(new_document.file_name),
            storage_path: Set(new_document.storage_path),
            content_type: Set(new_document.content_type),
            file_size: Set(new_document.file_size),
            is_processed: Set(false),
            analysis_result: Set(None),
            uploaded_by: Set(new_document.uploaded_by),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to create document")
    }

    /// Soft-deleted documents are invisible to all lookups.
    pub async fn get(&self, id: i32) -> Result<Option<documents::Model>> {
        documents::Entity::find_by_id(id)
            .filter(documents::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query document by ID")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<documents::Model>> {
        documents::Entity::find()
            .filter(documents::Column::UploadedBy.eq(user_id))
            .filter(documents::Column::IsActive.eq(true))
            .order_by_desc(documents::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list documents for user")
    }

    /// Marks the document processed and stores the analysis payload.
    pub async fn set_analysis(
        &self,
        id: i32,
        analysis_result: String,
    ) -> Result<Option<documents::Model>> {
        let Some(document) = self.get(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: documents::ActiveModel = document.into();
        active.is_processed = Set(true);
        active.analysis_result = Set(Some(analysis_result));
        active.updated_at = Set(now);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn deactivate(&self, id: i32) -> Result<bool> {
        let Some(document) = self.get(id).await? else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: documents::ActiveModel = document.into();
        active.is_active = Set(false);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }
}
