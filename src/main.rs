use log::*;
use service::{config::Config, logging::Logger, AppState};
use sse::{listener::LogListener, Broadcaster};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
        std::process::exit(1);
    }

    info!("Starting SSE relay...");

    let broadcaster = service::init_broadcaster(&config, Arc::new(LogListener));

    if let Some(period) = config.keep_alive_interval() {
        tokio::spawn(keep_alive(Arc::clone(&broadcaster), period));
    }

    let app_state = AppState::new(config, &broadcaster);

    if let Err(e) = web::init_server(app_state, shutdown_signal(Arc::clone(&broadcaster))).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }

    info!("SSE relay stopped");
}

/// Sends keep-alive comments on a fixed schedule so idle connections are not
/// cut by proxies.
async fn keep_alive(broadcaster: Arc<Broadcaster>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        broadcaster.keep_alive_all();
        trace!("Keep-alive sent, {} subscriber(s) live", broadcaster.count());
    }
}

async fn shutdown_signal(broadcaster: Arc<Broadcaster>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
    }

    info!("Shutdown requested, closing all subscribers");
    // Open event streams would otherwise keep graceful shutdown waiting forever
    broadcaster.close_all();
}
