use axum::{
    Extension, Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::warn;

use super::{ApiError, AppState};
use crate::domain::EventLogPayload;
use crate::services::CurrentUser;

/// GET /eventlogs
/// Admins get the full trail; everyone else only their own events.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<Vec<EventLogPayload>>, ApiError> {
    let logs = state
        .shared
        .event_log_service
        .logs_for(current_user.id, current_user.role)
        .await?;

    Ok(Json(logs.into_iter().map(EventLogPayload::from).collect()))
}

/// GET /eventlogs/stream
/// Live feed of event-log records as they are written.
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.shared.event_bus.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                Some((Ok(Event::default().data(json)), rx))
            }
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!("Client lagged by {count} messages");

                Some((
                    Ok(Event::default().event("warning").data("Missed some events")),
                    rx,
                ))
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
