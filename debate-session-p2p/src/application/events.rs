use debate_session_core::{Position, UserId};

/// What happened in the session since the last poll, in order.
///
/// The embedding UI renders these; the coordinator has already carried
/// out the store and transport side effects each event implies.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The other party appeared in the room's membership.
    OpponentJoined {
        user_id: UserId,
        display_name: String,
        position: Position,
    },
    /// The other party's membership entry disappeared, gracefully or
    /// not. The local side stays in the room waiting for a new joiner.
    OpponentLeft { user_id: UserId },
    /// The room record itself is gone; the local side was torn down.
    RoomClosed,
    /// The offer/answer exchange completed for the local role.
    HandshakeConnected,
    /// The remote peer's media stream arrived.
    RemoteTrack { stream_id: String },
    /// The shared start flag flipped; the local countdown is running.
    TimerStarted,
    /// One second elapsed on the local countdown.
    TimerTick { remaining_secs: u32 },
    /// The local countdown reached zero.
    TimerExpired,
}
