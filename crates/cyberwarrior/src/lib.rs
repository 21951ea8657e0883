//! # Cyberwarrior
//!
//! Authoritative server for Cyberwarrior, a two-player turn-based card
//! game played over WebSockets.
//!
//! Players sign in with a display name, create or join a room, and take
//! turns attacking, countering and defending with cards drawn from a
//! shared catalog. Every room runs as its own actor, so rooms never block
//! one another.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cyberwarrior::prelude::*;
//!
//! # async fn run() -> Result<(), CyberwarriorError> {
//! let catalog = CardCatalog::load("cards.json")?;
//! let server = CyberwarriorServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(catalog)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::CyberwarriorError;
pub use server::{CyberwarriorServer, CyberwarriorServerBuilder};

/// Everything needed to embed or test the server.
pub mod prelude {
    pub use crate::{CyberwarriorError, CyberwarriorServer, CyberwarriorServerBuilder};

    pub use cyberwarrior_catalog::{CardCatalog, CatalogError};
    pub use cyberwarrior_protocol::{
        Card, CardCategory, CardId, CardType, ClientEvent, Codec, JsonCodec, PlayRequest,
        ProtocolError, RoomId, Scores, ServerEvent, SessionId, SubCategory,
    };
    pub use cyberwarrior_room::{ActionRouter, RoomConfig, RoomError, RoomState};
    pub use cyberwarrior_session::{Session, SessionError, SessionManager, SessionRef};
    pub use cyberwarrior_transport::TransportError;
}
