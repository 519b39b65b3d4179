use serde::Serialize;

use crate::domain::Role;
use crate::entities::{documents, users};
use crate::services::auth_service::TokenPair;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_minutes: i64,
    pub role: Role,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in_minutes: pair.expires_in_minutes,
            role: pair.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub creation_date: String,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            creation_date: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: i32,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub is_processed: bool,
    pub analysis_result: Option<String>,
    pub creation_date: String,
    /// Per-line errors from a bulk import, present only on upload responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<String>>,
}

impl From<documents::Model> for DocumentDto {
    fn from(document: documents::Model) -> Self {
        Self {
            id: document.id,
            file_name: document.file_name,
            content_type: document.content_type,
            file_size: document.file_size,
            is_processed: document.is_processed,
            analysis_result: document.analysis_result,
            creation_date: document.created_at,
            validation_errors: None,
        }
    }
}
