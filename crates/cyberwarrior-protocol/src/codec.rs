//! Codec trait and the JSON implementation.
//!
//! The server speaks text frames, so `encode` produces a `String`.
//! `decode` takes bytes because the transport also accepts binary frames.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol values to and from their wire form.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`. Behind the `json` feature (default).
///
/// ```rust
/// use cyberwarrior_protocol::{ClientEvent, Codec, JsonCodec, ServerEvent};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec.decode(br#"{"type":"search"}"#).unwrap();
/// assert_eq!(event, ClientEvent::Search);
///
/// let text = codec.encode(&ServerEvent::Start { result: true }).unwrap();
/// assert_eq!(text, r#"{"type":"start","result":true}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
