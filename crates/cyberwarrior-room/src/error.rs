//! Error types for the room layer.

use cyberwarrior_protocol::{CardId, RoomId, SessionId};

use crate::RoomState;

/// Errors that can occur during room operations.
///
/// Every variant except [`MissingField`](Self::MissingField) is answered
/// with `result: false` to the requester alone.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (or closed while the request was in flight).
    #[error("room {0} not found")]
    NotFound(RoomId),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The session already occupies a room.
    #[error("session {0} is already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),

    #[error("session {0} is not in room {1}")]
    NotInRoom(SessionId, RoomId),

    #[error("session {0} is not in a room")]
    NoRoom(SessionId),

    /// The room is in a state that doesn't allow this operation.
    #[error("room {room_id} is {state}")]
    InvalidState { room_id: RoomId, state: RoomState },

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    #[error("session {0} is not the host")]
    NotHost(SessionId),

    #[error("room needs at least 2 players to start")]
    NotEnoughPlayers,

    /// The requester doesn't hold the role the current state requires.
    #[error("session {0} may not act now")]
    NotYourTurn(SessionId),

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("card {0} is not in hand")]
    CardNotInHand(CardId),

    #[error("card {0} is not in the catalog")]
    UnknownCard(CardId),

    /// Wrong card type for the action, or a WILD played as a defend.
    #[error("card {0} cannot be played this way")]
    IneligibleCard(CardId),

    #[error("card {0} does not match the attack category")]
    CategoryMismatch(CardId),

    #[error("card {0} shares no subcategory with the attack")]
    SubCategoryMismatch(CardId),

    #[error("game is over")]
    GameOver,
}

impl RoomError {
    /// True for protocol-class errors that are dropped without a reply.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::MissingField(_))
    }
}
