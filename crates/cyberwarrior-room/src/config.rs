//! Room configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room the server creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Cards dealt to each player when the game starts.
    pub hand_size: usize,

    /// A player wins once every scored category reaches this value.
    pub win_score_per_category: i32,

    /// Capacity of each room actor's command queue.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            hand_size: 5,
            win_score_per_category: 1,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Where a room is in its game.
///
/// ```text
///            start              attack
/// Waiting ─────────→ Turn ──────────────→ Counter
///                     ↑ │ defend/skip       │ counter/skip
///                     │ └──────┐  ┌─────────┘
///                     │        ▼  ▼
///                     └─────── (win?) ──→ End
/// ```
///
/// `Attack`, `Defend` and `Trivia` are reserved names that no transition
/// ever enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Turn,
    Attack,
    Defend,
    Counter,
    Trivia,
    End,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Turn => write!(f, "TURN"),
            Self::Attack => write!(f, "ATTACK"),
            Self::Defend => write!(f, "DEFEND"),
            Self::Counter => write!(f, "COUNTER"),
            Self::Trivia => write!(f, "TRIVIA"),
            Self::End => write!(f, "END"),
        }
    }
}
