use debate_session_core::SessionDescription;

/// Which end of the handshake this session drives. The room creator is
/// always the initiator; the joiner responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeRole {
    Initiator,
    Responder,
}

/// Handshake progress for the local role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing negotiated yet.
    Idle,
    /// Initiator only: local offer published, waiting for the answer.
    AwaitingAnswer,
    /// Responder only: remote offer applied, answer not yet published.
    HasRemoteOffer,
    /// Remote description applied on both ends of this role's exchange.
    Connected,
}

/// Observed facts fed into the machine: either something this session
/// did (published a description) or something that appeared in the
/// store.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeInput {
    OfferPublished,
    AnswerPublished,
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
}

/// Side effects the coordinator must carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum HandshakeAction {
    /// Apply the offer as remote description, then create, apply and
    /// publish an answer.
    ApplyRemoteOffer(SessionDescription),
    /// Apply the answer as remote description.
    ApplyRemoteAnswer(SessionDescription),
}

/// Pure offer/answer state machine.
///
/// Inputs that do not fit the current state are dropped, which is what
/// guards against replayed answers after teardown and against a
/// re-delivered offer: the store may re-fire a subscribed path with an
/// unchanged value at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    role: HandshakeRole,
    state: HandshakeState,
}

impl Handshake {
    pub fn new(role: HandshakeRole) -> Self {
        Self {
            role,
            state: HandshakeState::Idle,
        }
    }

    pub fn role(&self) -> HandshakeRole {
        self.role
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == HandshakeState::Connected
    }

    /// Advance the machine. Returns the action the coordinator must
    /// perform, if any.
    pub fn apply(&mut self, input: HandshakeInput) -> Option<HandshakeAction> {
        use HandshakeInput as In;
        use HandshakeRole::*;
        use HandshakeState::*;

        let (next, action) = match (self.role, self.state, input) {
            (Initiator, Idle, In::OfferPublished) => (AwaitingAnswer, None),
            (Initiator, AwaitingAnswer, In::RemoteAnswer(answer)) => {
                (Connected, Some(HandshakeAction::ApplyRemoteAnswer(answer)))
            }
            (Responder, Idle, In::RemoteOffer(offer)) => {
                (HasRemoteOffer, Some(HandshakeAction::ApplyRemoteOffer(offer)))
            }
            (Responder, HasRemoteOffer, In::AnswerPublished) => (Connected, None),
            (role, state, input) => {
                tracing::debug!(?role, ?state, ?input, "ignoring out-of-state handshake input");
                return None;
            }
        };

        tracing::debug!(role = ?self.role, from = ?self.state, to = ?next, "handshake transition");
        self.state = next;
        action
    }
}
