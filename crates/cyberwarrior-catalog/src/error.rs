use cyberwarrior_protocol::CardId;
use thiserror::Error;

/// Errors raised while building a [`CardCatalog`](crate::CardCatalog).
///
/// All of these are startup failures; a built catalog never errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is not a JSON array of rows: {0}")]
    Json(#[from] serde_json::Error),

    /// `row` is the 1-based position in the source, header included.
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },

    #[error("duplicate card id {0}")]
    DuplicateId(CardId),

    #[error("catalog has no cards")]
    Empty,
}
