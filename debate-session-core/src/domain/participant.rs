use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Stable user identifier handed out by the identity provider.
///
/// Opaque to the domain; it doubles as the key under the room's
/// `participants` and `candidates` subtrees.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The side a participant argues in a debate.
///
/// Exactly one participant may hold each side of a room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    For,
    Against,
}

impl Position {
    /// The side the opponent must take.
    pub fn opposite(&self) -> Self {
        match self {
            Position::For => Position::Against,
            Position::Against => Position::For,
        }
    }

    /// Store field name of the exclusivity flag for this side.
    pub fn taken_field(&self) -> &'static str {
        match self {
            Position::For => "forTaken",
            Position::Against => "againstTaken",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::For => write!(f, "for"),
            Position::Against => write!(f, "against"),
        }
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch.
///
/// Join timestamps are compared across two machines, so this is wall
/// time rather than a process-local monotonic clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(millis)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// One user's membership within a room: their label, chosen side, and
/// when they joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoomParticipant {
    pub email: String,
    pub position: Position,
    pub joined: Timestamp,
}

impl RoomParticipant {
    pub fn new(email: impl Into<String>, position: Position, joined: Timestamp) -> Self {
        Self {
            email: email.into(),
            position,
            joined,
        }
    }

    /// Short label for UI purposes: the local part of the email.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}
