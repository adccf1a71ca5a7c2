use crate::target::TargetId;
use log::*;

/// Observer for subscribers entering and leaving a [`Broadcaster`](crate::Broadcaster).
///
/// Both hooks default to doing nothing. They run synchronously on the thread
/// that caused the change, so implementations should return quickly.
pub trait SubscriberListener: Send + Sync {
    /// A subscription completed, including any replay.
    fn subscriber_joined(&self, _target_id: &TargetId) {}

    /// A target left the live set: pruned after a failed write, removed
    /// explicitly, or closed by `close_all`. Called once per target.
    fn subscriber_left(&self, _target_id: &TargetId) {}
}

/// Logs every join and leave at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl SubscriberListener for LogListener {
    fn subscriber_joined(&self, target_id: &TargetId) {
        info!("Subscriber {target_id} joined");
    }

    fn subscriber_left(&self, target_id: &TargetId) {
        info!("Subscriber {target_id} left");
    }
}
