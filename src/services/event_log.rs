use tokio::sync::broadcast;

use crate::db::Store;
use crate::domain::{EventLogPayload, NotificationEvent, Role};
use crate::entities::event_logs;

/// Persists audit events and fans them out to live listeners.
///
/// The row is committed first; the broadcast is best-effort and a missing
/// receiver is not an error.
pub struct EventLogService {
    store: Store,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl EventLogService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<NotificationEvent>) -> Self {
        Self { store, event_bus }
    }

    pub async fn log_event(
        &self,
        event_type: &str,
        description: &str,
        user_id: Option<i32>,
    ) -> anyhow::Result<event_logs::Model> {
        let record = self
            .store
            .add_event_log(event_type, description, user_id)
            .await?;

        let _ = self
            .event_bus
            .send(NotificationEvent::ReceiveLog(EventLogPayload::from(
                record.clone(),
            )));

        Ok(record)
    }

    /// Admins see the full trail; everyone else only their own events.
    pub async fn logs_for(
        &self,
        user_id: i32,
        role: Role,
    ) -> anyhow::Result<Vec<event_logs::Model>> {
        match role {
            Role::Admin => self.store.list_event_logs().await,
            Role::User => self.store.list_event_logs_for_user(user_id).await,
        }
    }
}
