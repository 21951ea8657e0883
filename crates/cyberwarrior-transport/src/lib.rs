//! Network edge of the Cyberwarrior server.
//!
//! Game clients speak JSON over WebSocket text frames. This crate accepts
//! those sockets and moves whole frames in and out; it never looks inside
//! them. Decoding into `ClientEvent`s happens one layer up, and rooms and
//! sessions only ever see decoded events plus a per-session outbound
//! queue.
//!
//! ```text
//! player's browser ──ws──→ Transport::accept ──→ Connection
//!                                                 ├─ recv: one event frame in
//!                                                 └─ send: one event frame out
//! ```
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Tags one socket in the logs (`conn-7`), before and after sign-in.
///
/// Unrelated to `SessionId`: a connection that never signs in still has
/// one, and ids are not reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of player connections for the server's accept loop.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next player to connect and finish any upgrade
    /// handshake. A failed upgrade is an error for that client only; the
    /// caller keeps accepting.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One player's socket, carrying one JSON event per frame.
///
/// The connection handler reads client events with `recv` while a
/// separate writer task pushes `ServerEvent`s with `send`, so the two must
/// be callable at the same time: a pending `recv` may not block `send`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one encoded server event as a text frame.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Next client event frame, as raw bytes for the codec. Text and binary
    /// frames are both accepted; control frames are skipped. `Ok(None)`
    /// means the player closed the socket, which the server treats as a
    /// disconnect.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
