//! Events fanned out to live listeners over the shared broadcast bus.
//!
//! These are serialized as `{"type": ..., "payload": ...}` on the SSE stream,
//! mirroring the rows written to the audit log.

use serde::Serialize;

use crate::entities::event_logs;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    ReceiveLog(EventLogPayload),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogPayload {
    pub id: i32,
    pub event_type: String,
    pub description: String,
    pub user_id: Option<i32>,
    pub creation_date: String,
}

impl From<event_logs::Model> for EventLogPayload {
    fn from(model: event_logs::Model) -> Self {
        Self {
            id: model.id,
            event_type: model.event_type,
            description: model.description,
            user_id: model.user_id,
            creation_date: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event = NotificationEvent::ReceiveLog(EventLogPayload {
            id: 7,
            event_type: "User Interaction".to_string(),
            description: "User alice logged in".to_string(),
            user_id: Some(3),
            creation_date: "2026-01-01T00:00:00Z".to_string(),
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReceiveLog");
        assert_eq!(json["payload"]["eventType"], "User Interaction");
        assert_eq!(json["payload"]["userId"], 3);
        assert_eq!(json["payload"]["creationDate"], "2026-01-01T00:00:00Z");
    }
}
