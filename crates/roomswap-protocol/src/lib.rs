//! Wire protocol for the Roomswap matcher.
//!
//! This crate defines the "language" a client speaks with the matcher
//! service that brokers room connections:
//!
//! - **Types** ([`RoomTarget`], [`MatcherRequest`], [`MatcherResponse`]) —
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (connection state). It doesn't know about connections or ticking —
//! it only knows how to describe and serialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{MatcherRequest, MatcherResponse, RoomTarget};
