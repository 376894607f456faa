//! Domain model for two-party timed video debates.
//!
//! One user creates a room declaring a topic and a side, a second user
//! joins on the opposing side, and both run an identical local countdown
//! once either of them starts the shared timer. The [`Room`] record is
//! also the wire format written to the synchronized store, so its field
//! names serialize in the store's camelCase schema.

pub mod domain;

pub use domain::{
    DebateTimer, IceCandidate, LeaveOutcome, Position, Room, RoomDraft, RoomError, RoomId,
    RoomParticipant, SdpType, SessionDescription, TimerEvent, TimerState, Timestamp, UserId,
};
