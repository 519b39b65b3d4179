use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Original file name as uploaded by the client.
    pub file_name: String,

    /// Path of the stored copy on disk (uuid-prefixed).
    pub storage_path: String,

    pub content_type: String,

    pub file_size: i64,

    pub is_processed: bool,

    /// JSON analysis result or bulk-import summary.
    pub analysis_result: Option<String>,

    pub uploaded_by: i32,

    /// Soft-delete flag; rows are never hard-deleted.
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
