use std::io;

/// Failures while moving frames between game clients and the server.
///
/// None of these are fatal to the process: the accept loop logs and
/// carries on, and a connection error only ends that player's session.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server could not listen on the configured address.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A TCP client connected but never completed the WebSocket upgrade.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    /// The player's socket is already closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// An outbound event frame could not be written.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// The socket broke while waiting for the next client event.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),
}
