use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, UserDto};
use crate::domain::Role;
use crate::services::CurrentUser;

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.shared.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// PUT /users/{id}/role
/// Admin only. The sole path that can grant Admin.
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UserDto>, ApiError> {
    if !current_user.role.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }

    let role = Role::parse_loose(&payload.role)
        .ok_or_else(|| ApiError::validation(format!("Unknown role '{}'", payload.role)))?;

    let user = state.shared.user_service.update_role(user_id, role).await?;
    Ok(Json(user.into()))
}
