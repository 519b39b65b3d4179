use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState, documents};
use crate::services::{AnalysisResult, CurrentUser, UploadRequest};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub document_id: i32,
    pub analysis: AnalysisResult,
}

/// POST /aianalysis/analyze
/// Stores the uploaded file as a document, runs AI analysis on it, and
/// attaches the result to the document record.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (file_name, content_type, bytes) = documents::read_file_field(&mut multipart).await?;

    let outcome = state
        .shared
        .document_service
        .upload(
            UploadRequest {
                file_name: file_name.clone(),
                content_type,
                bytes: bytes.clone(),
                process_type: None,
            },
            &current_user,
        )
        .await?;

    let analysis = state
        .shared
        .analysis_service
        .analyze(&bytes, &file_name)
        .await?;

    let analysis_json =
        serde_json::to_string(&analysis).map_err(|e| ApiError::internal(e.to_string()))?;

    let document = state
        .shared
        .document_service
        .record_analysis(outcome.document.id, analysis_json)
        .await?;

    Ok(Json(AnalyzeResponse {
        document_id: document.id,
        analysis,
    }))
}
