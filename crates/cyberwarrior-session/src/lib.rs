//! Player sessions for the Cyberwarrior game server.
//!
//! A [`Session`] exists from a successful sign-in until its connection
//! drops. [`SessionManager`] hands out ids and guarantees each session is
//! torn down once.
//!
//! ```text
//! Room Layer (above)  ← reads the session's name, room slot and sink
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← SessionId, RoomId, ServerEvent
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{DEFAULT_OUTBOUND_CAPACITY, EventSender, Session, SessionRef};
