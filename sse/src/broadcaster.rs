use crate::error::{Error, Result, SubscriptionErrorKind, TransportError};
use crate::event::Event;
use crate::history::{History, DEFAULT_CAPACITY};
use crate::listener::SubscriberListener;
use crate::target::{Target, TargetId};
use dashmap::DashMap;
use log::*;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type LiveTargets = Vec<(TargetId, Arc<dyn Target>)>;

/// One-to-many event delivery with replay for reconnecting subscribers.
///
/// The live set is a `DashMap`; broadcasts iterate a snapshot of it, so a
/// target can be pruned while other broadcasts are mid-flight and no map lock
/// is held across a transport write.
///
/// The history mutex is the single critical section that makes replay exact.
/// A broadcast records its event and snapshots its recipients under it, and a
/// subscription replays and registers under it. So for every id-bearing event
/// a subscriber either gets it live or gets it replayed, never both and never
/// neither, and replayed events always reach it before live ones.
pub struct Broadcaster {
    targets: DashMap<TargetId, Arc<dyn Target>>,
    history: Mutex<History>,
    listeners: Vec<Arc<dyn SubscriberListener>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A broadcaster whose history keeps the `capacity` most recent ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            targets: DashMap::new(),
            history: Mutex::new(History::with_capacity(capacity)),
            listeners: Vec::new(),
        }
    }

    /// Adds an observer. Observers are called in the order they were added.
    pub fn with_listener(mut self, listener: Arc<dyn SubscriberListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Registers `target` as a live subscriber.
    ///
    /// The target is acknowledged and opened, then receives `welcome` if
    /// given, then every buffered event newer than `last_event_id`, in id
    /// order. An empty `last_event_id` means no replay. If any of those writes
    /// fails the error is returned and the target is not registered.
    pub fn subscribe(
        &self,
        target: Arc<dyn Target>,
        welcome: Option<&Event>,
        last_event_id: Option<&str>,
    ) -> Result<()> {
        let target_id = target.id().clone();

        target
            .acknowledge()
            .map_err(|e| Error::subscription(SubscriptionErrorKind::Acknowledge, e))?;
        target
            .open()
            .map_err(|e| Error::subscription(SubscriptionErrorKind::Open, e))?;
        if let Some(welcome) = welcome {
            target
                .send(welcome)
                .map_err(|e| Error::subscription(SubscriptionErrorKind::Welcome, e))?;
        }

        {
            let history = self.lock_history();
            if let Some(last_event_id) = last_event_id.filter(|id| !id.is_empty()) {
                let missed = history.since(last_event_id);
                debug!(
                    "Replaying {} event(s) after id {last_event_id} to subscriber {target_id}",
                    missed.len()
                );
                for event in &missed {
                    target
                        .send(event)
                        .map_err(|e| Error::subscription(SubscriptionErrorKind::Replay, e))?;
                }
            }
            self.targets.insert(target_id.clone(), target);
        }

        info!("Registered subscriber {target_id}");
        for listener in &self.listeners {
            listener.subscriber_joined(&target_id);
        }
        Ok(())
    }

    /// Sends `event` to every live subscriber and records it in history if it
    /// has an id.
    ///
    /// Subscribers whose write fails are dropped from the live set on the spot
    /// and never retried. Returns whether at least one subscriber received the
    /// event; history is recorded either way.
    pub fn broadcast(&self, event: Event) -> bool {
        let recipients = {
            let mut history = self.lock_history();
            history.record(&event);
            self.live_targets()
        };

        let delivered = self.deliver(recipients, |target| target.send(&event));
        trace!("Delivered event {:?} to {delivered} subscriber(s)", event.id());
        delivered > 0
    }

    /// Broadcasts an event carrying only an event name and data.
    pub fn broadcast_message(&self, event: &str, data: &str) -> bool {
        self.broadcast(Event::builder().event(event).data(data).build())
    }

    /// Sends a keep-alive to every live subscriber, pruning the ones that fail.
    /// Keep-alives are never recorded.
    pub fn keep_alive_all(&self) {
        let recipients = self.live_targets();
        let alive = self.deliver(recipients, |target| target.keep_alive());
        trace!("Keep-alive reached {alive} subscriber(s)");
    }

    /// Closes and removes every live subscriber and clears the history.
    ///
    /// The broadcaster stays usable; later subscriptions start from an empty
    /// history.
    pub fn close_all(&self) {
        let recipients = {
            let mut history = self.lock_history();
            history.clear();
            self.live_targets()
        };

        info!("Closing {} subscriber(s)", recipients.len());
        for (target_id, target) in recipients {
            target.close();
            self.detach(&target_id);
        }
    }

    /// Removes one subscriber without closing its transport, for transports
    /// that manage their own connection lifecycle. Returns whether it was live.
    pub fn remove(&self, target_id: &TargetId) -> bool {
        self.detach(target_id)
    }

    /// Number of registered subscribers. A subscriber whose connection died
    /// is still counted until a write to it fails.
    pub fn count(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.is_empty()
    }

    /// Every event currently held for replay, oldest first.
    pub fn history_snapshot(&self) -> Vec<Event> {
        self.lock_history().since("")
    }

    fn lock_history(&self) -> MutexGuard<'_, History> {
        // The buffer is consistent between calls, so a panic elsewhere while
        // holding the lock leaves nothing to repair.
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live_targets(&self) -> LiveTargets {
        self.targets
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Runs `write` against each recipient and prunes the ones that fail.
    /// Returns how many writes succeeded.
    fn deliver<F>(&self, recipients: LiveTargets, write: F) -> usize
    where
        F: Fn(&dyn Target) -> core::result::Result<(), TransportError>,
    {
        let mut delivered = 0;
        for (target_id, target) in recipients {
            match write(target.as_ref()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Write to subscriber {target_id} failed: {e}. Removing it.");
                    self.detach(&target_id);
                }
            }
        }
        delivered
    }

    /// Drops a target from the live set, notifying listeners only if this call
    /// is the one that removed it.
    fn detach(&self, target_id: &TargetId) -> bool {
        if self.targets.remove(target_id).is_none() {
            return false;
        }
        for listener in &self.listeners {
            listener.subscriber_left(target_id);
        }
        true
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists the live subscriber ids, joined with `:`.
impl fmt::Display for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self
            .targets
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        f.write_str(&ids.join(":"))
    }
}
