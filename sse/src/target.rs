use crate::error::TransportError;
use crate::event::Event;
use std::fmt;

/// Identity of one subscriber, used only for registry lookup and removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(String);

impl TargetId {
    /// A fresh, process-unique id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One subscriber's outbound channel.
///
/// Implemented once per transport. The broadcaster only calls these methods;
/// it never owns the underlying connection and holds no lock of its own while
/// `send` or `keep_alive` runs for a live broadcast. Any error returned from
/// `acknowledge`, `open`, `send` or `keep_alive` means "subscriber gone",
/// whatever the cause.
pub trait Target: Send + Sync {
    fn id(&self) -> &TargetId;

    /// Transport-level handshake that marks the stream as an accepted event
    /// stream (status line, headers). Writes no payload.
    fn acknowledge(&self) -> Result<(), TransportError>;

    /// Tells the remote side the stream is live, conventionally by writing
    /// [`OPEN_NOTICE`](crate::event::OPEN_NOTICE).
    fn open(&self) -> Result<(), TransportError>;

    /// Writes one serialized event and flushes.
    fn send(&self, event: &Event) -> Result<(), TransportError>;

    /// Writes a unit carrying no data and no id, conventionally
    /// [`KEEP_ALIVE`](crate::event::KEEP_ALIVE), and flushes.
    fn keep_alive(&self) -> Result<(), TransportError>;

    /// Releases the connection. Must be idempotent and must not fail.
    fn close(&self);
}
