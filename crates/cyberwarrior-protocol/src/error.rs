use thiserror::Error;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Inbound bytes were malformed or did not match any known event.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Well-formed input carried a value outside the protocol's vocabulary.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
