use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::ApiResponse;
use crate::AppState;
use log::*;
use sse::Event;

/// Request body for publishing an event to every subscriber.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Event id. Only events with an id are kept for replay.
    pub id: Option<String>,
    /// Event name; clients listen for it with `addEventListener`.
    pub event: Option<String>,
    /// Payload. May span several lines.
    pub data: String,
    /// Reconnection delay hint in milliseconds.
    pub retry: Option<u64>,
}

impl From<BroadcastRequest> for Event {
    fn from(request: BroadcastRequest) -> Self {
        let mut builder = Event::builder().data(request.data);
        if let Some(id) = request.id {
            builder = builder.id(id);
        }
        if let Some(event) = request.event {
            builder = builder.event(event);
        }
        if let Some(retry) = request.retry {
            builder = builder.retry(retry);
        }
        builder.build()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BroadcastResult {
    /// Whether at least one subscriber received the event.
    pub delivered: bool,
    /// Subscribers still live after the broadcast.
    pub subscribers: usize,
}

/// POST broadcast an event
#[utoipa::path(
    post,
    path = "/events",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Event broadcast and recorded for replay", body = BroadcastResult),
        (status = 422, description = "Unprocessable Entity"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> impl IntoResponse {
    debug!(
        "POST broadcast event id={:?} name={:?}",
        request.id, request.event
    );

    if !app_state.broadcaster.has_subscribers() {
        debug!("No live subscribers, nothing will be delivered");
    }

    let delivered = app_state.broadcaster.broadcast(request.into());
    let result = BroadcastResult {
        delivered,
        subscribers: app_state.broadcaster.count(),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::new(StatusCode::OK.into(), result)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_converts_to_event() {
        let request: BroadcastRequest = serde_json::from_str(
            r#"{"id": "9", "event": "update", "data": "a\nb", "retry": 500}"#,
        )
        .unwrap();

        let event = Event::from(request);

        assert_eq!(event.to_string(), "id: 9\nevent: update\ndata: a\ndata: b\nretry: 500\n\n");
    }

    #[test]
    fn test_request_with_only_data() {
        let request: BroadcastRequest = serde_json::from_str(r#"{"data": "x"}"#).unwrap();

        let event = Event::from(request);

        assert_eq!(event.id(), None);
        assert_eq!(event.event(), None);
        assert_eq!(event.data(), "x");
    }
}
