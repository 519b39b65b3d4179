//! `SeaORM` implementation of the `DocumentService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::db::{NewDocument, NewUser, Store};
use crate::entities::documents;
use crate::services::auth_service::CurrentUser;
use crate::services::csv_import::{self, ImportSummary};
use crate::services::document_service::{
    DocumentError, DocumentService, UploadOutcome, UploadRequest,
};
use crate::services::event_log::EventLogService;
use crate::services::password;
use crate::services::storage::FileStorage;

/// Content types accepted for the bulk user import path.
const CSV_CONTENT_TYPES: [&str; 3] = ["text/csv", "application/vnd.ms-excel", "text/plain"];

const PROCESS_TYPE_USER_BULK: &str = "UserBulk";

pub struct SeaOrmDocumentService {
    store: Store,
    storage: Arc<dyn FileStorage>,
    events: Arc<EventLogService>,
    security: SecurityConfig,
}

impl SeaOrmDocumentService {
    #[must_use]
    pub fn new(
        store: Store,
        storage: Arc<dyn FileStorage>,
        events: Arc<EventLogService>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            storage,
            events,
            security,
        }
    }

    /// Inserts the rows that pass; failures are collected, not fatal.
    /// The database check also catches duplicates within the file itself
    /// because rows are inserted as they are accepted.
    async fn import_users(&self, content: &str) -> Result<ImportSummary, DocumentError> {
        let (rows, mut errors) = csv_import::parse_rows(content);
        let mut success_count = 0;

        for row in rows {
            if self
                .store
                .get_user_by_username(&row.username)
                .await
                .map_err(DocumentError::from)?
                .is_some()
            {
                errors.push(format!(
                    "Line {}: username '{}' already exists",
                    row.line, row.username
                ));
                continue;
            }

            let password_hash = password::hash_async(&row.password, Some(&self.security)).await?;

            self.store
                .create_user(NewUser {
                    username: row.username,
                    email: row.email,
                    password_hash,
                    role: row.role.as_str().to_string(),
                })
                .await?;

            success_count += 1;
        }

        Ok(ImportSummary {
            success_count,
            failure_count: errors.len(),
            errors,
        })
    }

    fn ensure_owner_or_admin(
        document: &documents::Model,
        actor: &CurrentUser,
    ) -> Result<(), DocumentError> {
        if document.uploaded_by == actor.id || actor.role.is_admin() {
            Ok(())
        } else {
            Err(DocumentError::Forbidden)
        }
    }
}

#[async_trait]
impl DocumentService for SeaOrmDocumentService {
    async fn upload(
        &self,
        request: UploadRequest,
        actor: &CurrentUser,
    ) -> Result<UploadOutcome, DocumentError> {
        if request.file_name.trim().is_empty() {
            return Err(DocumentError::Validation("File name is required".to_string()));
        }

        let is_bulk_import = request.process_type.as_deref() == Some(PROCESS_TYPE_USER_BULK)
            && CSV_CONTENT_TYPES.contains(&request.content_type.as_str());

        if is_bulk_import && !actor.role.is_admin() {
            return Err(DocumentError::Forbidden);
        }

        // Rejecting before the file or the document row is persisted keeps a
        // failed upload from leaving state behind.
        let bulk_content = if is_bulk_import {
            let content = std::str::from_utf8(&request.bytes).map_err(|_| {
                DocumentError::Validation("Import file is not valid UTF-8".to_string())
            })?;
            Some(content.to_string())
        } else {
            None
        };

        let storage_path = self.storage.save(&request.file_name, &request.bytes).await?;

        let file_size = i64::try_from(request.bytes.len())
            .map_err(|_| DocumentError::Validation("File too large".to_string()))?;

        let mut document = self
            .store
            .create_document(NewDocument {
                file_name: request.file_name.clone(),
                storage_path,
                content_type: request.content_type.clone(),
                file_size,
                uploaded_by: actor.id,
            })
            .await?;

        let mut validation_errors = Vec::new();

        if let Some(content) = bulk_content {
            let summary = self.import_users(&content).await?;
            validation_errors.clone_from(&summary.errors);

            let summary_json = serde_json::to_string(&summary)
                .map_err(|e| DocumentError::Internal(e.to_string()))?;

            document = self
                .store
                .set_document_analysis(document.id, summary_json)
                .await?
                .ok_or(DocumentError::NotFound(document.id))?;
        }

        if let Err(e) = self
            .events
            .log_event(
                "Document Upload",
                &format!("User {} uploaded {}", actor.username, request.file_name),
                Some(actor.id),
            )
            .await
        {
            warn!(error = %e, "Failed to record upload event");
        }

        Ok(UploadOutcome {
            document,
            validation_errors,
        })
    }

    async fn list_for(&self, actor: &CurrentUser) -> Result<Vec<documents::Model>, DocumentError> {
        Ok(self.store.list_documents_for_user(actor.id).await?)
    }

    async fn download(
        &self,
        document_id: i32,
        actor: &CurrentUser,
    ) -> Result<(documents::Model, Vec<u8>), DocumentError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(DocumentError::NotFound(document_id))?;

        Self::ensure_owner_or_admin(&document, actor)?;

        let bytes = self.storage.read(&document.storage_path).await?;
        Ok((document, bytes))
    }

    async fn delete(&self, document_id: i32, actor: &CurrentUser) -> Result<(), DocumentError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(DocumentError::NotFound(document_id))?;

        Self::ensure_owner_or_admin(&document, actor)?;

        self.store.deactivate_document(document_id).await?;

        if let Err(e) = self
            .events
            .log_event(
                "Document Deletion",
                &format!("User {} deleted {}", actor.username, document.file_name),
                Some(actor.id),
            )
            .await
        {
            warn!(error = %e, "Failed to record deletion event");
        }

        Ok(())
    }

    async fn record_analysis(
        &self,
        document_id: i32,
        analysis_json: String,
    ) -> Result<documents::Model, DocumentError> {
        self.store
            .set_document_analysis(document_id, analysis_json)
            .await?
            .ok_or(DocumentError::NotFound(document_id))
    }
}
