//! Error types for the room layer.

/// Errors that can occur when operating a [`Room`](crate::Room).
///
/// Connection failures are not errors here — they surface through the
/// state machine as `Disconnected`/`Error` transitions with a
/// [`DisconnectEvent`](crate::DisconnectEvent). These variants cover
/// misuse of the API itself.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A room is single-use; this one already started a connection attempt.
    #[error("room has already started a connection attempt")]
    AlreadyStarted,

    /// The room has been disposed and can no longer be used.
    #[error("room has been disposed")]
    Disposed,

    /// A required connect option was unset and no ambient default filled it.
    #[error("connect options missing required field `{0}`")]
    MissingOption(&'static str),
}
