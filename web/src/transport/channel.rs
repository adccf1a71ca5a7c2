use bytes::Bytes;
use log::*;
use sse::error::TransportError;
use sse::event::{KEEP_ALIVE, OPEN_NOTICE};
use sse::{Event, Target, TargetId};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A [`Target`] that writes serialized events into an unbounded channel.
///
/// The receiving half becomes the HTTP response body. When the client goes
/// away axum drops the body, the receiver with it, and the next write here
/// fails, which the broadcaster takes as "subscriber gone".
pub struct ChannelTarget {
    id: TargetId,
    // Taken on close so the response stream ends.
    sender: Mutex<Option<UnboundedSender<Bytes>>>,
    last_event_id: Mutex<Option<String>>,
}

impl ChannelTarget {
    pub fn new() -> (Self, UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let target = Self {
            id: TargetId::new(),
            sender: Mutex::new(Some(tx)),
            last_event_id: Mutex::new(None),
        };
        (target, rx)
    }

    /// Id of the last id-bearing event written to this subscriber.
    pub fn last_event_id(&self) -> Option<String> {
        self.last_event_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn sender(&self) -> MutexGuard<'_, Option<UnboundedSender<Bytes>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, chunk: Bytes) -> Result<(), TransportError> {
        match self.sender().as_ref() {
            Some(tx) => tx.send(chunk).map_err(|_| TransportError::closed()),
            None => Err(TransportError::closed()),
        }
    }
}

impl Target for ChannelTarget {
    fn id(&self) -> &TargetId {
        &self.id
    }

    // Status and headers are written by the handler's response; all that is
    // left to check is that the client has not already gone.
    fn acknowledge(&self) -> Result<(), TransportError> {
        match self.sender().as_ref() {
            Some(tx) if !tx.is_closed() => Ok(()),
            _ => Err(TransportError::closed()),
        }
    }

    fn open(&self) -> Result<(), TransportError> {
        self.write(Bytes::from_static(OPEN_NOTICE.as_bytes()))
    }

    fn send(&self, event: &Event) -> Result<(), TransportError> {
        self.write(Bytes::from(event.to_string()))?;
        match event.id() {
            Some(id) => {
                *self
                    .last_event_id
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(id.to_string());
            }
            None => debug!(
                "#{} event without id, it cannot be replayed: {:?}",
                self.id,
                event.event()
            ),
        }
        Ok(())
    }

    fn keep_alive(&self) -> Result<(), TransportError> {
        self.write(Bytes::from_static(KEEP_ALIVE.as_bytes()))
    }

    fn close(&self) {
        if self.sender().take().is_some() {
            trace!("#{} channel closed", self.id);
        }
    }
}
