//! Wire protocol for the Cyberwarrior game server.
//!
//! - **Types**: ids ([`SessionId`], [`RoomId`], [`CardId`]), cards and
//!   scores, inbound [`ClientEvent`] and outbound [`ServerEvent`].
//! - **Codec**: [`Codec`] trait and [`JsonCodec`].
//! - **Errors**: [`ProtocolError`].
//!
//! The protocol layer knows nothing about connections or rooms; it only
//! describes what travels on the wire.

mod card;
mod codec;
mod error;
mod event;
mod types;

pub use card::{Card, CardCategory, CardType, PlayersScores, Scores, SubCategory};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{
    AttackPlayed, ClientEvent, CounterPlayed, DefendPlayed, JoinNotice, LeaveNotice, Outcome,
    PlayEvent, PlayRequest, RoomCreated, RoomRoster, RoomSummary, ServerEvent, SkipPlayed,
};
pub use types::{CardId, Recipient, RoomId, SessionId};
