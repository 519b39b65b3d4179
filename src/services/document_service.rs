//! Domain service for document upload, retrieval, and lifecycle.

use thiserror::Error;

use crate::entities::documents;
use crate::services::auth_service::CurrentUser;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document {0} not found")]
    NotFound(i32),

    #[error("Not allowed")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DocumentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DocumentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// "UserBulk" triggers the admin-only CSV import path.
    pub process_type: Option<String>,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub document: documents::Model,
    /// Per-line errors from a bulk import, empty otherwise.
    pub validation_errors: Vec<String>,
}

#[async_trait::async_trait]
pub trait DocumentService: Send + Sync {
    /// Stores the file and creates the document record. A "UserBulk" CSV
    /// upload additionally runs the user import, which only admins may do.
    async fn upload(
        &self,
        request: UploadRequest,
        actor: &CurrentUser,
    ) -> Result<UploadOutcome, DocumentError>;

    /// Documents uploaded by the caller.
    async fn list_for(&self, actor: &CurrentUser) -> Result<Vec<documents::Model>, DocumentError>;

    /// Owner or admin may download.
    async fn download(
        &self,
        document_id: i32,
        actor: &CurrentUser,
    ) -> Result<(documents::Model, Vec<u8>), DocumentError>;

    /// Soft-delete; owner or admin only.
    async fn delete(&self, document_id: i32, actor: &CurrentUser) -> Result<(), DocumentError>;

    /// Marks the document processed and attaches the analysis payload.
    async fn record_analysis(
        &self,
        document_id: i32,
        analysis_json: String,
    ) -> Result<documents::Model, DocumentError>;
}
