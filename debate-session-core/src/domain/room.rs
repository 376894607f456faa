use crate::domain::{IceCandidate, Position, RoomParticipant, SessionDescription, Timestamp, UserId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Store-generated identifier of a room record.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the creator asks for when opening a room. `position` is an
/// `Option` because the UI form may submit without a side selected;
/// [`Room::create`] rejects that.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDraft {
    pub topic: String,
    pub category: String,
    pub position: Option<Position>,
    pub duration_minutes: u32,
}

/// Errors for room operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum RoomError {
    #[error("a debate topic is required")]
    EmptyTopic,

    #[error("a position (for/against) is required")]
    MissingPosition,

    #[error("debate duration must be at least one minute")]
    InvalidDuration,

    #[error("room is full")]
    RoomFull,

    #[error("the {0} side is already taken")]
    SideTaken(Position),

    #[error("participant not found: {0}")]
    ParticipantNotFound(UserId),

    #[error("timer has already been started")]
    TimerAlreadyStarted,
}

/// Outcome of removing a participant: either the record survives with
/// its signaling fields cleared, or the whole room must be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Delete the entire room record; no single-party room may persist.
    Delete,
    /// Keep the room; `offer`/`answer` were cleared so a future joiner
    /// starts a fresh handshake.
    Keep,
}

/// One debate session record. This aggregate doubles as the wire format
/// stored under `rooms/{id}`, so fields serialize in camelCase and the
/// `candidates` subtree keeps the store's push-key map shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    topic: String,
    category: String,
    duration: u32,
    created_by: UserId,
    creator_email: String,
    #[serde(default)]
    participants: HashMap<UserId, RoomParticipant>,
    for_taken: bool,
    against_taken: bool,
    participant_count: u32,
    timer_started: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offer: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    candidates: HashMap<UserId, BTreeMap<String, IceCandidate>>,
    created_at: Timestamp,
}

impl Room {
    /// Create a room with the creator as its first participant.
    pub fn create(
        draft: RoomDraft,
        creator: UserId,
        creator_email: impl Into<String>,
    ) -> Result<Self, RoomError> {
        if draft.topic.trim().is_empty() {
            return Err(RoomError::EmptyTopic);
        }
        let position = draft.position.ok_or(RoomError::MissingPosition)?;
        if draft.duration_minutes == 0 {
            return Err(RoomError::InvalidDuration);
        }

        let creator_email = creator_email.into();
        let now = Timestamp::now();
        let mut participants = HashMap::new();
        participants.insert(
            creator.clone(),
            RoomParticipant::new(creator_email.clone(), position, now),
        );

        Ok(Room {
            topic: draft.topic,
            category: draft.category,
            duration: draft.duration_minutes,
            created_by: creator,
            creator_email,
            participants,
            for_taken: position == Position::For,
            against_taken: position == Position::Against,
            participant_count: 1,
            timer_started: false,
            offer: None,
            answer: None,
            candidates: HashMap::new(),
            created_at: now,
        })
    }

    // ===== Getters =====

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn creator_email(&self) -> &str {
        &self.creator_email
    }

    pub fn participants(&self) -> &HashMap<UserId, RoomParticipant> {
        &self.participants
    }

    pub fn participant_count(&self) -> u32 {
        self.participant_count
    }

    pub fn for_taken(&self) -> bool {
        self.for_taken
    }

    pub fn against_taken(&self) -> bool {
        self.against_taken
    }

    pub fn timer_started(&self) -> bool {
        self.timer_started
    }

    pub fn offer(&self) -> Option<&SessionDescription> {
        self.offer.as_ref()
    }

    pub fn answer(&self) -> Option<&SessionDescription> {
        self.answer.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= 2
    }

    /// Side a new joiner could still take, if any.
    pub fn available_position(&self) -> Option<Position> {
        if self.is_full() {
            return None;
        }
        if !self.for_taken {
            Some(Position::For)
        } else if !self.against_taken {
            Some(Position::Against)
        } else {
            None
        }
    }

    pub fn position_of(&self, user_id: &UserId) -> Option<Position> {
        self.participants.get(user_id).map(|p| p.position)
    }

    /// A user's queued candidates, in store push-key (arrival) order.
    pub fn candidates_for(&self, user_id: &UserId) -> Vec<&IceCandidate> {
        self.candidates
            .get(user_id)
            .map(|queue| queue.values().collect())
            .unwrap_or_default()
    }

    // ===== Transitions =====

    /// Add the second participant.
    ///
    /// Capacity and side exclusivity are judged against the participants
    /// map itself, not the stored counter, so a drifted counter cannot
    /// admit a third member or a duplicate side. Re-joining with an
    /// identical membership is a no-op.
    pub fn join(
        &mut self,
        user_id: UserId,
        email: impl Into<String>,
        position: Position,
        joined: Timestamp,
    ) -> Result<(), RoomError> {
        if self.participants.contains_key(&user_id) {
            return Ok(());
        }
        if self.participants.len() >= 2 {
            return Err(RoomError::RoomFull);
        }
        let side_taken = match position {
            Position::For => self.for_taken,
            Position::Against => self.against_taken,
        };
        if side_taken || self.participants.values().any(|p| p.position == position) {
            return Err(RoomError::SideTaken(position));
        }

        self.participants
            .insert(user_id, RoomParticipant::new(email, position, joined));
        match position {
            Position::For => self.for_taken = true,
            Position::Against => self.against_taken = true,
        }
        self.participant_count = self.participants.len() as u32;
        Ok(())
    }

    /// Remove a participant and their queued candidates.
    ///
    /// The room is deleted outright when the creator leaves or when the
    /// departure would leave at most one member behind; otherwise the
    /// record survives with the leaver's side freed and the signaling
    /// fields cleared for a fresh handshake.
    pub fn leave(&mut self, user_id: &UserId) -> Result<LeaveOutcome, RoomError> {
        let removed = self
            .participants
            .remove(user_id)
            .ok_or_else(|| RoomError::ParticipantNotFound(user_id.clone()))?;
        self.candidates.remove(user_id);
        self.participant_count = self.participants.len() as u32;

        if *user_id == self.created_by || self.participants.len() <= 1 {
            return Ok(LeaveOutcome::Delete);
        }

        match removed.position {
            Position::For => self.for_taken = false,
            Position::Against => self.against_taken = false,
        }
        self.offer = None;
        self.answer = None;
        Ok(LeaveOutcome::Keep)
    }

    /// Re-derive `participantCount` and the side flags from the
    /// participants map, and drop candidates queued by absent users.
    /// Used after an ungraceful disconnect removed a membership entry
    /// without the rest of the graceful-leave cleanup. Returns whether
    /// anything changed.
    pub fn reconcile(&mut self) -> bool {
        let count = self.participants.len() as u32;
        let for_taken = self
            .participants
            .values()
            .any(|p| p.position == Position::For);
        let against_taken = self
            .participants
            .values()
            .any(|p| p.position == Position::Against);
        let stale_candidates = self
            .candidates
            .keys()
            .any(|user| !self.participants.contains_key(user));

        let changed = count != self.participant_count
            || for_taken != self.for_taken
            || against_taken != self.against_taken
            || stale_candidates;

        self.participant_count = count;
        self.for_taken = for_taken;
        self.against_taken = against_taken;
        let participants = &self.participants;
        self.candidates.retain(|user, _| participants.contains_key(user));

        changed
    }

    /// Flip the shared timer flag. One-way: a second start is an error
    /// so callers can disable the control.
    pub fn start_timer(&mut self) -> Result<(), RoomError> {
        if self.timer_started {
            return Err(RoomError::TimerAlreadyStarted);
        }
        self.timer_started = true;
        Ok(())
    }
}
