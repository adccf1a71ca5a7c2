//! Server-Sent Events (SSE) broadcast engine.
//!
//! This crate fans text events out to every attached subscriber and lets a
//! subscriber that dropped off reconnect and receive only what it missed. It
//! knows nothing about HTTP; transports plug in through the [`Target`] trait.
//!
//! # Architecture
//!
//! - **Transport-agnostic targets**: each subscriber is an `Arc<dyn Target>`
//!   exposing acknowledge/open/send/keep-alive/close. The broadcaster never
//!   owns the connection behind it.
//! - **Concurrent live set**: subscribers live in a `DashMap` keyed by
//!   [`TargetId`]. Broadcasts iterate a snapshot, so a slow or dead subscriber
//!   never holds a registry lock while its write runs.
//! - **Bounded replay history**: the last N id-bearing events (10 by default)
//!   are kept in a [`History`] ordered by normalized id, numeric ids compared
//!   numerically.
//! - **Prune on failure**: any transport error during a broadcast or
//!   keep-alive removes that subscriber immediately. Producers only see a
//!   `bool` telling whether anyone received the event.
//!
//! # Message Flow
//!
//! 1. A transport accepts a connection and wraps it in a `Target`
//! 2. It calls [`Broadcaster::subscribe`] with the client's last-seen id, if any
//! 3. The target is acknowledged, sent the open notice, then replayed every
//!    buffered event newer than that id
//! 4. Producers call [`Broadcaster::broadcast`]; every live target gets the event
//!    and the event is kept for replay
//! 5. A scheduler calls [`Broadcaster::keep_alive_all`] so idle connections
//!    survive proxies
//! 6. On shutdown [`Broadcaster::close_all`] closes everything
//!
//! # Example
//!
//! ```rust
//! use sse::{memory::MemoryTarget, Broadcaster, Event};
//! use std::sync::Arc;
//!
//! let broadcaster = Broadcaster::new();
//! broadcaster.broadcast(Event::builder().id("1").data("missed").build());
//!
//! let target = Arc::new(MemoryTarget::new());
//! broadcaster.subscribe(target.clone(), None, Some("0")).unwrap();
//! broadcaster.broadcast(Event::builder().id("2").data("live").build());
//!
//! assert_eq!(target.event_ids(), vec!["1", "2"]);
//! ```
//!
//! # Limitations
//!
//! - Replay is best effort: events evicted from history are gone.
//! - Streams mixing numeric and non-numeric ids have no defined relative
//!   order between the two kinds.
//!
//! # Modules
//!
//! - `broadcaster`: the live set, fan-out, pruning and replay
//! - `event`: the immutable event record and its wire format
//! - `history`: the bounded replay buffer and id normalization
//! - `target`: the transport contract and subscriber identity
//! - `listener`: join/leave observers
//! - `memory`: an in-memory transport for tests and demos
//! - `error`: transport and subscription errors

pub mod broadcaster;
pub mod error;
pub mod event;
pub mod history;
pub mod listener;
pub mod memory;
pub mod target;

pub use broadcaster::Broadcaster;
pub use error::{Error, ErrorKind, TransportError};
pub use event::Event;
pub use history::History;
pub use listener::SubscriberListener;
pub use target::{Target, TargetId};
