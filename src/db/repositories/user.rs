use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::users;

/// Column values for a new account row. The password arrives already hashed;
/// this layer never sees plaintext.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    /// Refresh tokens are opaque; the row lookup is the only validity check
    /// besides the stored expiry.
    pub async fn get_by_refresh_token(&self, token: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::RefreshToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by refresh token")
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn create(&self, new_user: NewUser) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            refresh_token: Set(None),
            refresh_token_expires_at: Set(None),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to create user")
    }

    /// Overwrites the single refresh slot. Both fields move together.
    pub async fn set_refresh_token(
        &self,
        user_id: i32,
        token: Option<String>,
        expires_at: Option<String>,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for refresh token update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.refresh_token = Set(token);
        active.refresh_token_expires_at = Set(expires_at);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn update_role(&self, user_id: i32, role: &str) -> Result<Option<users::Model>> {
        let Some(user) = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for role update")?
        else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.to_string());
        active.updated_at = Set(now);
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }
}
