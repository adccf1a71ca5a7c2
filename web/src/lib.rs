//! HTTP layer for the relay.
//!
//! Subscribers connect with `GET /events` and get a Server-Sent Events
//! stream; producers publish with `POST /events`. All broadcast semantics
//! (replay, pruning, keep-alives) live in the `sse` crate; this crate only
//! adapts axum requests and response bodies to it.

use log::*;
use std::future::Future;
use tokio::net::TcpListener;

pub(crate) mod controller;
pub mod error;
pub mod router;
pub mod transport;

pub use error::{Error, Result};
pub use service::AppState;

/// Binds to the configured address and serves until `shutdown` resolves.
///
/// Event streams never finish on their own, so `shutdown` must close the
/// broadcaster's subscribers (`close_all`) for the server to drain.
pub async fn init_server<F>(app_state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = app_state.config.listen_address();
    let listener = TcpListener::bind(&address).await?;

    info!("Server starting... listening for connections on http://{address}");

    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(shutdown)
        .await
}
