use config::Config;
use log::info;
use sse::Broadcaster;
use std::sync::Arc;

pub mod config;
pub mod logging;

/// Builds the broadcaster described by `config`, with `listener` observing
/// subscribers.
pub fn init_broadcaster(
    config: &Config,
    listener: Arc<dyn sse::SubscriberListener>,
) -> Arc<Broadcaster> {
    info!(
        "Broadcaster config: history_capacity={}, keep_alive_interval_secs={}",
        config.history_capacity, config.keep_alive_interval_secs,
    );

    Arc::new(Broadcaster::with_capacity(config.history_capacity).with_listener(listener))
}

// Service-level state shared by every request handler
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, broadcaster: &Arc<Broadcaster>) -> Self {
        Self {
            broadcaster: Arc::clone(broadcaster),
            config: app_config,
        }
    }
}
