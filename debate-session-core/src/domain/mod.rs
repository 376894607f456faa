mod participant;
mod room;
mod signaling;
mod timer;
pub mod topics;

pub use participant::{Position, RoomParticipant, Timestamp, UserId};
pub use room::{LeaveOutcome, Room, RoomDraft, RoomError, RoomId};
pub use signaling::{IceCandidate, SdpType, SessionDescription};
pub use timer::{DebateTimer, TimerEvent, TimerState};
