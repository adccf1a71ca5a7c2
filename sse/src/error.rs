//! Error types for the `sse` crate.
//!
//! Two separate types live here. `TransportError` is what a [`Target`](crate::target::Target)
//! reports when it cannot write to its subscriber; the broadcaster absorbs it by pruning
//! the target. `Error` is what the broadcaster itself hands back to callers, currently
//! only when a subscription cannot be completed.
use std::error::Error as StdError;
use std::fmt;
use std::io;

pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error type for the broadcast core.
/// The `source` field holds the transport failure that caused it, if any.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors raised by the broadcaster.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Subscription(SubscriptionErrorKind),
}

/// The step of `subscribe` that failed. Whatever the step, the target was not
/// left registered.
#[derive(Debug, PartialEq)]
pub enum SubscriptionErrorKind {
    Acknowledge,
    Open,
    Welcome,
    Replay,
}

impl Error {
    pub(crate) fn subscription(kind: SubscriptionErrorKind, err: TransportError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Subscription(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Subscription(kind) => write!(f, "Subscription failed during {kind:?}")?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Failure writing to, or handshaking with, one subscriber.
///
/// The broadcaster treats every kind the same way ("subscriber gone"); the kind
/// exists for logging and for transports that want to tell causes apart.
#[derive(Debug)]
pub struct TransportError {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: TransportErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum TransportErrorKind {
    /// The target was closed, or the remote side went away.
    Closed,
    Io,
    Other(String),
}

impl TransportError {
    pub fn closed() -> Self {
        TransportError {
            source: None,
            error_kind: TransportErrorKind::Closed,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        TransportError {
            source: None,
            error_kind: TransportErrorKind::Other(message.into()),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            TransportErrorKind::Closed => write!(f, "transport closed"),
            TransportErrorKind::Io => match &self.source {
                Some(source) => write!(f, "transport I/O failure: {source}"),
                None => write!(f, "transport I/O failure"),
            },
            TransportErrorKind::Other(message) => write!(f, "transport failure: {message}"),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        TransportError {
            source: Some(Box::new(err)),
            error_kind: TransportErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_error_keeps_transport_error_as_source() {
        let err = Error::subscription(
            SubscriptionErrorKind::Open,
            TransportError::from(io::Error::new(io::ErrorKind::BrokenPipe, "reset")),
        );

        assert_eq!(
            err.error_kind,
            ErrorKind::Subscription(SubscriptionErrorKind::Open)
        );
        let source = StdError::source(&err).expect("source should be present");
        assert!(source.to_string().contains("reset"));
        assert_eq!(
            err.to_string(),
            "Subscription failed during Open: transport I/O failure: reset"
        );
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::closed().to_string(), "transport closed");
        assert_eq!(
            TransportError::other("half-closed").to_string(),
            "transport failure: half-closed"
        );
    }
}
