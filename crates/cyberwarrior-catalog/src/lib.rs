//! Card catalog for the Cyberwarrior game server.
//!
//! [`CardCatalog`] is loaded once before any room accepts actions and is
//! then shared read-only by every room.

mod catalog;
mod error;

pub use catalog::CardCatalog;
pub use error::CatalogError;
