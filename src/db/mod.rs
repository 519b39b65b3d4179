use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{documents, event_logs, users};

pub mod migrator;
pub mod repositories;

pub use repositories::document::NewDocument;
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn document_repo(&self) -> repositories::document::DocumentRepository {
        repositories::document::DocumentRepository::new(self.conn.clone())
    }

    fn event_log_repo(&self) -> repositories::event_log::EventLogRepository {
        repositories::event_log::EventLogRepository::new(self.conn.clone())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_refresh_token(&self, token: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_refresh_token(token).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_all().await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<users::Model> {
        self.user_repo().create(new_user).await
    }

    pub async fn set_refresh_token(
        &self,
        user_id: i32,
        token: Option<String>,
        expires_at: Option<String>,
    ) -> Result<()> {
        self.user_repo()
            .set_refresh_token(user_id, token, expires_at)
            .await
    }

    pub async fn update_user_role(&self, user_id: i32, role: &str) -> Result<Option<users::Model>> {
        self.user_repo().update_role(user_id, role).await
    }

    pub async fn create_document(&self, new_document: NewDocument) -> Result<documents::Model> {
        self.document_repo().create(new_document).await
    }

    pub async fn get_document(&self, id: i32) -> Result<Option<documents::Model>> {
        self.document_repo().get(id).await
    }

    pub async fn list_documents_for_user(&self, user_id: i32) -> Result<Vec<documents::Model>> {
        self.document_repo().list_for_user(user_id).await
    }

    pub async fn set_document_analysis(
        &self,
        id: i32,
        analysis_result: String,
    ) -> Result<Option<documents::Model>> {
        self.document_repo().set_analysis(id, analysis_result).await
    }

    pub async fn deactivate_document(&self, id: i32) -> Result<bool> {
        self.document_repo().deactivate(id).await
    }

    pub async fn add_event_log(
        &self,
        event_type: &str,
        description: &str,
        user_id: Option<i32>,
    ) -> Result<event_logs::Model> {
        self.event_log_repo()
            .add(event_type, description, user_id)
            .await
    }

    pub async fn list_event_logs(&self) -> Result<Vec<event_logs::Model>> {
        self.event_log_repo().list_all().await
    }

    pub async fn list_event_logs_for_user(&self, user_id: i32) -> Result<Vec<event_logs::Model>> {
        self.event_log_repo().list_for_user(user_id).await
    }
}
