//! Codec trait and implementations for serializing matcher messages.
//!
//! The room layer doesn't care how messages become bytes — it just needs
//! something implementing [`Codec`]. [`JsonCodec`] is the default; a
//! binary codec can be added later without touching any other code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts matcher messages to and from raw bytes.
///
/// `Send + Sync + 'static` because codecs are used inside long-lived
/// Tokio tasks that may run on any worker thread.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] using JSON via `serde_json`.
///
/// Human-readable, which matters for a protocol spoken with matcher
/// services written in other languages. Behind the `json` feature flag
/// (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{MatcherRequest, MatcherResponse, RoomTarget};

    #[test]
    fn test_encode_decode_round_trip() {
        let codec = JsonCodec;
        let msg = MatcherRequest::Matchmake {
            app_key: "key-1".into(),
            group: "default".into(),
            capacity: 16,
        };
        let bytes = codec.encode(&msg).unwrap();
        let back: MatcherRequest = codec.decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_decode_malformed_bytes_fails() {
        let codec = JsonCodec;
        let result: Result<MatcherResponse, _> = codec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_type_fails() {
        let codec = JsonCodec;
        let bytes = codec
            .encode(&RoomTarget::Room { name: "alpha".into() })
            .unwrap();
        let result: Result<MatcherRequest, _> = codec.decode(&bytes);
        assert!(result.is_err());
    }
}
