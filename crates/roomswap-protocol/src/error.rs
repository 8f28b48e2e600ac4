//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding matcher messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed — malformed bytes, missing fields, or a
    /// message that doesn't match the expected type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
