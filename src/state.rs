//! Shared application state wired from the configuration.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::NotificationEvent;
use crate::services::{
    AnalysisService, AuthService, DocumentService, EventLogService, GeminiAnalysisService,
    LocalFileStorage, SeaOrmAuthService, SeaOrmDocumentService, SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,
    pub store: Store,
    /// Fan-out bus for live event log notifications.
    pub event_bus: broadcast::Sender<NotificationEvent>,
    pub event_log_service: Arc<EventLogService>,
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub document_service: Arc<dyn DocumentService>,
    pub analysis_service: Arc<dyn AnalysisService>,
}

impl SharedState {
    pub async fn new(config: Config) -> Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);

        let event_log_service = Arc::new(EventLogService::new(store.clone(), event_bus.clone()));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            &config.auth,
            config.security.clone(),
            event_log_service.clone(),
        ));

        let user_service = Arc::new(SeaOrmUserService::new(store.clone()));

        let storage = Arc::new(LocalFileStorage::new(config.storage.upload_path.clone()));

        let document_service = Arc::new(SeaOrmDocumentService::new(
            store.clone(),
            storage,
            event_log_service.clone(),
            config.security.clone(),
        ));

        let analysis_service = Arc::new(GeminiAnalysisService::new(
            config.ai.clone(),
            event_log_service.clone(),
        )?);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            event_bus,
            event_log_service,
            auth_service,
            user_service,
            document_service,
            analysis_service,
        })
    }
}
