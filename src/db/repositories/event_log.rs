use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::event_logs;

pub struct EventLogRepository {
    conn: DatabaseConnection,
}

impl EventLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        event_type: &str,
        description: &str,
        user_id: Option<i32>,
    ) -> Result<event_logs::Model> {
        let active = event_logs::ActiveModel {
            event_type: Set(event_type.to_string()),
            description: Set(description.to_string()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert event log")
    }

    pub async fn list_all(&self) -> Result<Vec<event_logs::Model>> {
        event_logs::Entity::find()
            .order_by_desc(event_logs::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list event logs")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<event_logs::Model>> {
        event_logs::Entity::find()
            .filter(event_logs::Column::UserId.eq(user_id))
            .order_by_desc(event_logs::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list event logs for user")
    }
}
