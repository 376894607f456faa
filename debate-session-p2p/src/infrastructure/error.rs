use debate_session_core::{RoomError, RoomId};

/// Synchronized-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    ReadFailed(String),

    #[error("store write failed: {0}")]
    WriteFailed(String),

    #[error("store connection lost")]
    Disconnected,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Peer transport failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to create session description: {0}")]
    Negotiation(String),

    #[error("failed to apply session description: {0}")]
    Description(String),

    #[error("failed to apply ICE candidate: {0}")]
    Candidate(String),

    #[error("transport is closed")]
    Closed,
}

/// Local media capture failures.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("camera/microphone access denied")]
    PermissionDenied,

    #[error("no capture device available")]
    NoDevice,

    #[error("media capture failed: {0}")]
    Capture(String),
}

/// Top-level session errors surfaced to the embedding UI.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("not currently in a room")]
    NotInRoom,

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
