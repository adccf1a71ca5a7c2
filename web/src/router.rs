use crate::{
    controller::{event_controller, health_check_controller},
    transport::handler::{self, LAST_EVENT_ID},
    AppState,
};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "SSE Relay API",
            description = "Publish events and subscribe to them as a Server-Sent Events stream"
        ),
        paths(
            event_controller::create,
            handler::sse_handler,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                event_controller::BroadcastRequest,
                event_controller::BroadcastResult,
            )
        ),
        tags(
            (name = "sse_relay", description = "One-to-many event delivery with replay on reconnect")
        )
    )]
pub struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .merge(event_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn event_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/events",
            get(handler::sse_handler).post(event_controller::create),
        )
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, LAST_EVENT_ID])
}
