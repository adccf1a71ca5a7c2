//! In-memory [`Target`] that records everything written to it.
//!
//! Useful for tests and for wiring the broadcaster without a network. Writes
//! can be made to fail on demand to simulate a subscriber dropping off.
use crate::error::TransportError;
use crate::event::{Event, KEEP_ALIVE, OPEN_NOTICE};
use crate::target::{Target, TargetId};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One unit written to a [`MemoryTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Open,
    Event(Event),
    KeepAlive,
}

#[derive(Debug, Default)]
struct State {
    frames: Vec<Frame>,
    wire: String,
    acknowledged: bool,
    closed: bool,
    // Writes still allowed to succeed; `None` means unlimited.
    write_budget: Option<usize>,
}

#[derive(Debug)]
pub struct MemoryTarget {
    id: TargetId,
    state: Mutex<State>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::with_id(TargetId::new())
    }

    pub fn with_id(id: impl Into<TargetId>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Every write from now on fails with a broken-pipe error.
    pub fn fail_writes(&self) {
        self.state().write_budget = Some(0);
    }

    /// Lets the next `writes` writes succeed, then fails every write after.
    pub fn fail_after(&self, writes: usize) {
        self.state().write_budget = Some(writes);
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.state().frames.clone()
    }

    /// Only the events, skipping open notices and keep-alives.
    pub fn events(&self) -> Vec<Event> {
        self.state()
            .frames
            .iter()
            .filter_map(|frame| match frame {
                Frame::Event(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Ids of the received events, in arrival order. Events without an id are skipped.
    pub fn event_ids(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| event.id().map(str::to_owned))
            .collect()
    }

    /// The exact bytes a network transport would have written.
    pub fn wire(&self) -> String {
        self.state().wire.clone()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.state().acknowledged
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, frame: Frame, text: &str) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.closed {
            return Err(TransportError::closed());
        }
        if let Some(remaining) = state.write_budget.as_mut() {
            if *remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "subscriber went away").into());
            }
            *remaining -= 1;
        }
        state.frames.push(frame);
        state.wire.push_str(text);
        Ok(())
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for MemoryTarget {
    fn id(&self) -> &TargetId {
        &self.id
    }

    fn acknowledge(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.closed {
            return Err(TransportError::closed());
        }
        state.acknowledged = true;
        Ok(())
    }

    fn open(&self) -> Result<(), TransportError> {
        self.write(Frame::Open, OPEN_NOTICE)
    }

    fn send(&self, event: &Event) -> Result<(), TransportError> {
        self.write(Frame::Event(event.clone()), &event.to_string())
    }

    fn keep_alive(&self) -> Result<(), TransportError> {
        self.write(Frame::KeepAlive, KEEP_ALIVE)
    }

    fn close(&self) {
        self.state().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;

    #[test]
    fn test_records_frames_and_wire_text() {
        let target = MemoryTarget::new();
        target.open().unwrap();
        target.send(&Event::builder().id("1").data("hi").build()).unwrap();
        target.keep_alive().unwrap();

        assert_eq!(target.frames().len(), 3);
        assert_eq!(target.event_ids(), vec!["1"]);
        assert_eq!(target.wire(), "event: open\n\nid: 1\ndata: hi\n\n:\n\n");
    }

    #[test]
    fn test_fail_after_allows_a_fixed_number_of_writes() {
        let target = MemoryTarget::new();
        target.fail_after(1);

        assert!(target.open().is_ok());
        let err = target.send(&Event::new("x")).unwrap_err();
        assert_eq!(err.error_kind, TransportErrorKind::Io);
        assert_eq!(target.frames(), vec![Frame::Open]);
    }

    #[test]
    fn test_close_is_idempotent_and_rejects_writes() {
        let target = MemoryTarget::new();
        target.close();
        target.close();

        assert!(target.is_closed());
        assert_eq!(
            target.keep_alive().unwrap_err().error_kind,
            TransportErrorKind::Closed
        );
        assert!(target.acknowledge().is_err());
    }
}
