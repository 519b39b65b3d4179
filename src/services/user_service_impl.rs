//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::domain::Role;
use crate::entities::users;
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list_users(&self) -> Result<Vec<users::Model>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn update_role(&self, user_id: i32, role: Role) -> Result<users::Model, UserError> {
        self.store
            .update_user_role(user_id, role.as_str())
            .await?
            .ok_or(UserError::NotFound(user_id))
    }
}
