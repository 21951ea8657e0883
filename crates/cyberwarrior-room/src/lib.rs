//! Room lifecycle and the turn state machine.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! game state, so actions on one room are serialized while different
//! rooms run independently.
//!
//! # Key types
//!
//! - [`Room`]: the turn state machine itself, plain synchronous data
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: creates, finds and removes rooms
//! - [`ActionRouter`]: maps decoded client events onto rooms
//! - [`RoomState`] and [`RoomConfig`]

mod config;
mod error;
mod game;
mod manager;
mod room;
mod router;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use game::{Departure, MAX_PLAYERS, Outbox, Room};
pub use manager::RoomRegistry;
pub use room::{LeaveOutcome, RoomHandle, RoomInfo};
pub use router::ActionRouter;
