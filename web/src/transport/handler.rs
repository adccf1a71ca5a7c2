use crate::transport::channel::ChannelTarget;
use crate::{AppState, Error};
use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use log::*;
use sse::{Broadcaster, Target};
use std::convert::Infallible;
use std::sync::Arc;

/// Header a reconnecting EventSource uses to report the last id it saw.
pub const LAST_EVENT_ID: HeaderName = HeaderName::from_static("last-event-id");

/// GET open a long-lived event stream
///
/// Replays buffered events newer than `Last-Event-ID`, then streams live
/// broadcasts until the client disconnects.
#[utoipa::path(
    get,
    path = "/events",
    params(
        ("Last-Event-ID" = Option<String>, Header, description = "Id of the last event the client received before reconnecting")
    ),
    responses(
        (status = 200, description = "Event stream opened", content_type = "text/event-stream", body = String),
        (status = 503, description = "Subscriber went away during the handshake")
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    version: Version,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let last_event_id = headers
        .get(LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    let (target, mut rx) = ChannelTarget::new();
    let target = Arc::new(target);
    debug!(
        "Establishing SSE connection {} (last event id: {last_event_id:?})",
        target.id()
    );

    app_state
        .broadcaster
        .subscribe(target.clone(), None, last_event_id)?;

    let registration = Registration {
        broadcaster: Arc::clone(&app_state.broadcaster),
        target,
    };
    // Events arrive from the channel already in wire format
    let body = stream! {
        let _registration = registration;
        while let Some(chunk) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    };

    // Not axum's `Sse`: it wants its own `Event` type, and chunks here are
    // already wire format written by the broadcaster.
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    // Connection-specific headers are forbidden from HTTP/2 on
    if version < Version::HTTP_2 {
        response_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }

    Ok((StatusCode::OK, response_headers, Body::from_stream(body)).into_response())
}

/// Keeps a subscriber registered for as long as its response body lives.
///
/// axum drops the body when the client disconnects, so the subscriber leaves
/// the live set right away instead of waiting for the next failed write.
struct Registration {
    broadcaster: Arc<Broadcaster>,
    target: Arc<ChannelTarget>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let target_id = self.target.id();
        if self.broadcaster.remove(target_id) {
            debug!(
                "SSE connection {target_id} dropped by the client (last event id: {:?})",
                self.target.last_event_id()
            );
        } else {
            trace!("SSE connection {target_id} already detached");
        }
    }
}
