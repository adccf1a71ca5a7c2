//! HTTP transport for the broadcaster.
//!
//! `channel` adapts an axum response body to the `sse::Target` contract and
//! `handler` is the endpoint subscribers connect to. Broadcast logic stays in
//! the `sse` crate.

pub mod channel;
pub mod handler;
