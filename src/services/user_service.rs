//! Domain service for account administration.

use thiserror::Error;

use crate::domain::Role;
use crate::entities::users;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<users::Model>, UserError>;

    /// Admin-only role change. This is the only path that can grant Admin;
    /// registration always produces a plain user.
    async fn update_role(&self, user_id: i32, role: Role) -> Result<users::Model, UserError>;
}
