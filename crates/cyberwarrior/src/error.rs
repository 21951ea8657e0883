//! Unified error type for the Cyberwarrior server.

use cyberwarrior_catalog::CatalogError;
use cyberwarrior_protocol::ProtocolError;
use cyberwarrior_room::RoomError;
use cyberwarrior_session::SessionError;
use cyberwarrior_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CyberwarriorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The card catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A session-level error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),
}
