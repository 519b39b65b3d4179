use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, DocumentDto};
use crate::services::{CurrentUser, UploadRequest};

#[derive(Deserialize)]
pub struct UploadQuery {
    /// Processing hint, e.g. "UserBulk" for the admin CSV import.
    #[serde(rename = "type")]
    pub process_type: Option<String>,
}

/// Pulls the "file" part out of a multipart body.
pub(super) async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<(String, String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        return Ok((file_name, content_type, bytes.to_vec()));
    }

    Err(ApiError::validation("Missing 'file' field"))
}

/// POST /documents/upload?type=
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<DocumentDto>, ApiError> {
    let (file_name, content_type, bytes) = read_file_field(&mut multipart).await?;

    let outcome = state
        .shared
        .document_service
        .upload(
            UploadRequest {
                file_name,
                content_type,
                bytes,
                process_type: query.process_type,
            },
            &current_user,
        )
        .await?;

    let mut dto = DocumentDto::from(outcome.document);
    dto.validation_errors = Some(outcome.validation_errors);

    Ok(Json(dto))
}

/// GET /documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<Vec<DocumentDto>>, ApiError> {
    let documents = state
        .shared
        .document_service
        .list_for(&current_user)
        .await?;

    Ok(Json(documents.into_iter().map(DocumentDto::from).collect()))
}

/// GET /documents/{id}/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(document_id): Path<i32>,
) -> Result<Response, ApiError> {
    let (document, bytes) = state
        .shared
        .document_service
        .download(document_id, &current_user)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, document.content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ),
    ];

    Ok((headers, bytes).into_response())
}

/// DELETE /documents/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(document_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state
        .shared
        .document_service
        .delete(document_id, &current_user)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
