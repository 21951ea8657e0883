//! Inbound and outbound event shapes.
//!
//! Every message is a flat JSON object with a `type` field. Play events
//! carry a second discriminator, `action`. Inbound payload fields are all
//! `Option` so that a request with a missing field still decodes; the room
//! decides what a missing field means.

use serde::{Deserialize, Serialize};

use crate::{Card, CardId, PlayersScores, RoomId};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    Signin {
        #[serde(rename = "playerName")]
        player_name: Option<String>,
    },
    Create {
        #[serde(rename = "gameName")]
        game_name: Option<String>,
    },
    Search,
    Join {
        #[serde(rename = "gameId")]
        game_id: Option<RoomId>,
    },
    Leave,
    Start,
    Play(PlayRequest),
}

impl ClientEvent {
    /// The wire `type` of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::Signin { .. } => "signin",
            ClientEvent::Create { .. } => "create",
            ClientEvent::Search => "search",
            ClientEvent::Join { .. } => "join",
            ClientEvent::Leave => "leave",
            ClientEvent::Start => "start",
            ClientEvent::Play(_) => "play",
        }
    }
}

/// The closed set of in-game actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlayRequest {
    Attack {
        #[serde(rename = "cardId")]
        card_id: Option<CardId>,
    },
    Defend {
        #[serde(rename = "cardId")]
        card_id: Option<CardId>,
    },
    Counter {
        #[serde(rename = "cardId")]
        card_id: Option<CardId>,
    },
    Skip,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// `result` plus an optional body that is flattened into the same object.
///
/// A rejection is just `{"result": false}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub result: bool,
    #[serde(flatten)]
    pub body: Option<T>,
}

impl<T> Outcome<T> {
    pub fn accepted(body: T) -> Self {
        Self {
            result: true,
            body: Some(body),
        }
    }

    pub fn rejected() -> Self {
        Self {
            result: false,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub game_id: RoomId,
    pub game_name: String,
}

/// One row of a `search` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub game_id: RoomId,
    pub game_name: String,
    pub player_count: usize,
    pub is_full: bool,
}

/// Room membership as seen by clients. Names are display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRoster {
    pub game_id: RoomId,
    pub game_name: String,
    pub host: String,
    pub players: Vec<String>,
    pub is_can_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinNotice {
    pub player_join: String,
    #[serde(flatten)]
    pub roster: RoomRoster,
}

/// Sent to remaining members with the updated roster, and to each
/// departing player without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveNotice {
    pub player_leave: String,
    #[serde(flatten)]
    pub roster: Option<RoomRoster>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackPlayed {
    pub player_attack: String,
    pub player_target: String,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendPlayed {
    pub player_defend: String,
    pub card: Card,
    pub players_scores: PlayersScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterPlayed {
    pub player_counter: String,
    pub card: Card,
    pub players_scores: PlayersScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipPlayed {
    pub player_skip: String,
    pub players_scores: PlayersScores,
}

/// In-game notifications, nested under `{"type": "play"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlayEvent {
    Attack(Outcome<AttackPlayed>),
    Defend(Outcome<DefendPlayed>),
    Counter(Outcome<CounterPlayed>),
    Skip(Outcome<SkipPlayed>),
    /// Private to the player whose hand grew.
    Draw { result: bool, cards: Vec<Card> },
    #[serde(rename_all = "camelCase")]
    Turn { result: bool, player_turn: String },
    #[serde(rename_all = "camelCase")]
    End { result: bool, player_win: String },
}

/// A message from the server to one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    Signin { result: bool },
    Create(Outcome<RoomCreated>),
    Search { result: bool, rooms: Vec<RoomSummary> },
    Join(Outcome<JoinNotice>),
    Leave(Outcome<LeaveNotice>),
    Start { result: bool },
    Play(PlayEvent),
}
