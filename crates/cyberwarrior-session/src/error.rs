//! Error types for the session layer.

use cyberwarrior_protocol::SessionId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given id. Disconnecting twice lands
    /// here the second time.
    #[error("session {0} not found")]
    NotFound(SessionId),
}
