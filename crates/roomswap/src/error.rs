//! Unified error type for the Roomswap client stack.

use roomswap_protocol::ProtocolError;
use roomswap_room::RoomError;
use roomswap_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// When using the `roomswap` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attributes generate the `From` impls the `?` operator needs.
///
/// Note that connection *failures* are not errors: they surface as
/// disconnect events through the observer streams. These variants cover
/// API misuse and setup problems.
#[derive(Debug, thiserror::Error)]
pub enum RoomswapError {
    /// A transport-level error (dial, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (single-use violation, missing options).
    #[error(transparent)]
    Room(#[from] RoomError),
}
