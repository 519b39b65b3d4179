use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, MessageResponse, TokenResponse};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Verifies the `Authorization: Bearer <token>` header and attaches the
/// resolved [`CurrentUser`](crate::services::CurrentUser) to the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let user = state.shared.auth_service.authenticate(&token).await?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account. The role is always User; only an admin can promote
/// an account afterwards.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .shared
        .auth_service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "User registered successfully".to_string(),
    }))
}

/// POST /auth/login
/// Authenticate with username and password, returns an access/refresh pair
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .shared
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(pair.into()))
}

/// POST /auth/refresh
/// Rotate a refresh token; the presented token stops working
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state
        .shared
        .auth_service
        .refresh(&payload.refresh_token)
        .await?;

    Ok(Json(pair.into()))
}
