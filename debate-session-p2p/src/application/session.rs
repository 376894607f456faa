use crate::application::config::SessionConfig;
use crate::application::events::SessionEvent;
use crate::domain::{Handshake, HandshakeAction, HandshakeInput, HandshakeRole, HandshakeState};
use crate::infrastructure::error::{Result, SessionError, TransportError};
use crate::infrastructure::identity::{IdentityProvider, UserProfile};
use crate::infrastructure::store::{StorePath, Subscription, SyncStore, TxCommit, TxResult};
use crate::infrastructure::transport::{
    LocalMedia, MediaDevices, PeerTransport, TransportEvent, TransportFactory,
};
use debate_session_core::{
    DebateTimer, LeaveOutcome, Position, Room, RoomDraft, RoomError, RoomId, RoomParticipant,
    SessionDescription, TimerEvent, Timestamp, UserId,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything tied to the room the local user currently occupies.
struct ActiveRoom {
    room_id: RoomId,
    room_path: StorePath,
    user: UserProfile,
    handshake: Handshake,
    transport: Box<dyn PeerTransport>,
    media: LocalMedia,
    timer: DebateTimer,
    subscription: Subscription,
    remote_user: Option<UserId>,
    /// How many of each peer's queued candidates have been fed to the
    /// transport; the store re-fires whole subtrees, so candidates past
    /// this mark are the only new ones.
    applied_candidates: HashMap<UserId, usize>,
}

enum MembershipChange {
    None,
    Joined(UserId, String, Position),
    Lost(UserId),
    CreatorGone,
}

/// Coordinates one user's participation in a debate: room lifecycle,
/// the offer/answer/ICE handshake over the store, presence, and the
/// shared countdown.
///
/// The embedder drives it with [`DebateSession::poll`] whenever store or
/// transport activity may have occurred and [`DebateSession::tick`] once
/// per second; all state lives here, none in globals.
pub struct DebateSession {
    store: Arc<dyn SyncStore>,
    transports: Arc<dyn TransportFactory>,
    media: Arc<dyn MediaDevices>,
    identity: Arc<dyn IdentityProvider>,
    config: SessionConfig,
    active: Option<ActiveRoom>,
}

impl DebateSession {
    pub fn new(
        store: Arc<dyn SyncStore>,
        transports: Arc<dyn TransportFactory>,
        media: Arc<dyn MediaDevices>,
        identity: Arc<dyn IdentityProvider>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            transports,
            media,
            identity,
            config,
            active: None,
        }
    }

    // ===== Room lifecycle =====

    /// Open a new room with the local user on their chosen side,
    /// publish it under a store-generated key, and pre-publish the
    /// offer so a joiner can answer straight away.
    pub async fn create_room(&mut self, draft: RoomDraft) -> Result<RoomId> {
        let user = self.signed_in()?;
        let room = Room::create(draft, user.id.clone(), user.email.clone())?;
        let duration = room.duration_minutes();

        let key = self
            .store
            .push(&self.config.rooms_root, serde_json::to_value(&room)?)
            .await?;
        let room_id = RoomId::new(key);
        let room_path = self.room_path(&room_id);

        let mut media = match self.media.capture().await {
            Ok(media) => media,
            Err(err) => {
                // No orphan record for a creator who never got a camera.
                self.store.remove(&room_path).await?;
                return Err(err.into());
            }
        };

        self.store
            .on_disconnect_remove(&room_path.child("participants").child(user.id.as_str()))
            .await?;

        let mut transport = self.transports.create(&self.config.ice_servers);
        transport.attach_media(&media);
        let offer = match Self::initial_offer(&mut transport).await {
            Ok(offer) => offer,
            Err(err) => {
                media.stop();
                self.store.remove(&room_path).await?;
                return Err(err);
            }
        };
        self.store
            .write(&room_path.child("offer"), serde_json::to_value(&offer)?)
            .await?;

        let mut handshake = Handshake::new(HandshakeRole::Initiator);
        handshake.apply(HandshakeInput::OfferPublished);

        let subscription = self.store.subscribe(&room_path);
        tracing::info!(room = %room_id, user = %user.id, "room created");

        self.active = Some(ActiveRoom {
            room_id: room_id.clone(),
            room_path,
            user,
            handshake,
            transport,
            media,
            timer: DebateTimer::new(duration),
            subscription,
            remote_user: None,
            applied_candidates: HashMap::new(),
        });
        Ok(room_id)
    }

    /// Take the open side of an existing room. Membership is claimed
    /// through a store transaction, so two simultaneous joiners cannot
    /// both slip into the second slot. Returns the side taken.
    pub async fn join_room(&mut self, room_id: &RoomId) -> Result<Position> {
        let user = self.signed_in()?;
        let room_path = self.room_path(room_id);

        // Fail fast on a missing or full room before touching the
        // camera.
        let Some(value) = self.store.read(&room_path).await? else {
            return Err(SessionError::RoomNotFound(room_id.clone()));
        };
        let preview: Room = serde_json::from_value(value)?;
        if preview.available_position().is_none() {
            return Err(RoomError::RoomFull.into());
        }
        let duration = preview.duration_minutes();

        let mut media = self.media.capture().await?;

        let user_id = user.id.clone();
        let email = user.email.clone();
        let id_for_tx = room_id.clone();
        let mut failure: Option<SessionError> = None;
        let mut taken: Option<Position> = None;
        let commit = self
            .store
            .transaction(&room_path, &mut |snapshot| {
                failure = None;
                taken = None;
                let Some(value) = snapshot else {
                    failure = Some(SessionError::RoomNotFound(id_for_tx.clone()));
                    return TxResult::Abort;
                };
                let mut room: Room = match serde_json::from_value(value) {
                    Ok(room) => room,
                    Err(err) => {
                        failure = Some(err.into());
                        return TxResult::Abort;
                    }
                };
                let Some(position) = room.available_position() else {
                    failure = Some(RoomError::RoomFull.into());
                    return TxResult::Abort;
                };
                if let Err(err) = room.join(user_id.clone(), email.clone(), position, Timestamp::now())
                {
                    failure = Some(err.into());
                    return TxResult::Abort;
                }
                match serde_json::to_value(&room) {
                    Ok(value) => {
                        taken = Some(position);
                        TxResult::Update(value)
                    }
                    Err(err) => {
                        failure = Some(err.into());
                        TxResult::Abort
                    }
                }
            })
            .await;

        let commit = match commit {
            Ok(commit) => commit,
            Err(err) => {
                media.stop();
                return Err(err.into());
            }
        };
        let position = match (commit, taken) {
            (TxCommit::Committed(_), Some(position)) => position,
            _ => {
                media.stop();
                return Err(
                    failure.unwrap_or_else(|| SessionError::RoomNotFound(room_id.clone()))
                );
            }
        };

        self.store
            .on_disconnect_remove(&room_path.child("participants").child(user.id.as_str()))
            .await?;

        let mut transport = self.transports.create(&self.config.ice_servers);
        transport.attach_media(&media);

        // The stored offer arrives through the subscription's immediate
        // snapshot and is answered on the next poll.
        let subscription = self.store.subscribe(&room_path);
        tracing::info!(room = %room_id, user = %user.id, %position, "room joined");

        self.active = Some(ActiveRoom {
            room_id: room_id.clone(),
            room_path,
            user,
            handshake: Handshake::new(HandshakeRole::Responder),
            transport,
            media,
            timer: DebateTimer::new(duration),
            subscription,
            remote_user: None,
            applied_candidates: HashMap::new(),
        });
        Ok(position)
    }

    /// Graceful exit: tear down the local side, then either delete the
    /// room or hand it back to the store with this user's traces
    /// removed. A no-op when not in a room.
    pub async fn leave_room(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };
        active.timer.stop();
        active.transport.close();
        active.media.stop();

        let Some(value) = self.store.read(&active.room_path).await? else {
            return Ok(());
        };
        let mut room: Room = serde_json::from_value(value)?;
        match room.leave(&active.user.id) {
            Ok(LeaveOutcome::Delete) => self.store.remove(&active.room_path).await?,
            Ok(LeaveOutcome::Keep) => {
                self.store
                    .write(&active.room_path, serde_json::to_value(&room)?)
                    .await?
            }
            // Our entry is already gone; nothing left to clean up.
            Err(RoomError::ParticipantNotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
        tracing::info!(room = %active.room_id, user = %active.user.id, "room left");
        Ok(())
    }

    // ===== Timer =====

    /// Flip the shared start flag. Both sides then start their local
    /// countdowns from the flag via [`DebateSession::poll`], so the
    /// starter has no head start over the opponent.
    pub async fn start_timer(&mut self) -> Result<()> {
        let Some(active) = self.active.as_ref() else {
            return Err(SessionError::NotInRoom);
        };
        let Some(value) = self.store.read(&active.room_path).await? else {
            return Err(SessionError::RoomNotFound(active.room_id.clone()));
        };
        let mut room: Room = serde_json::from_value(value)?;
        room.start_timer()?;
        self.store
            .write(&active.room_path.child("timerStarted"), json!(true))
            .await?;
        Ok(())
    }

    /// Advance the local countdown by one second. The embedder calls
    /// this from its own once-per-second schedule.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        let active = self.active.as_mut()?;
        match active.timer.tick()? {
            TimerEvent::Tick { remaining_secs } => Some(SessionEvent::TimerTick { remaining_secs }),
            TimerEvent::Expired => Some(SessionEvent::TimerExpired),
        }
    }

    // ===== Event pump =====

    /// Drain transport and store activity, carry out the side effects
    /// they imply, and report what happened. Cheap when nothing is
    /// pending.
    pub async fn poll(&mut self) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();
        if self.active.is_none() {
            return Ok(events);
        }

        self.pump_transport(&mut events).await?;
        let closed = self.pump_store(&mut events).await?;
        if closed {
            if let Some(mut active) = self.active.take() {
                active.timer.stop();
                active.transport.close();
                active.media.stop();
                tracing::info!(room = %active.room_id, "room closed");
            }
            events.push(SessionEvent::RoomClosed);
        }
        Ok(events)
    }

    async fn pump_transport(&mut self, events: &mut Vec<SessionEvent>) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        for event in active.transport.poll_events() {
            match event {
                TransportEvent::IceCandidate(candidate) => {
                    let path = active
                        .room_path
                        .child("candidates")
                        .child(active.user.id.as_str());
                    self.store
                        .push(&path, serde_json::to_value(&candidate)?)
                        .await?;
                }
                TransportEvent::RemoteTrack { stream_id } => {
                    events.push(SessionEvent::RemoteTrack { stream_id });
                }
            }
        }
        Ok(())
    }

    /// Returns whether the room closed under us.
    async fn pump_store(&mut self, events: &mut Vec<SessionEvent>) -> Result<bool> {
        let snapshots = match self.active.as_mut() {
            Some(active) => active.subscription.drain(),
            None => return Ok(false),
        };
        for snapshot in snapshots {
            let Some(value) = snapshot else {
                return Ok(true);
            };
            let room: Room = match serde_json::from_value(value) {
                Ok(room) => room,
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed room snapshot");
                    continue;
                }
            };
            if self.apply_room_snapshot(room, events).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn apply_room_snapshot(
        &mut self,
        room: Room,
        events: &mut Vec<SessionEvent>,
    ) -> Result<bool> {
        let change = {
            let Some(active) = self.active.as_mut() else {
                return Ok(false);
            };
            let opponent = room
                .participants()
                .iter()
                .find(|(id, _)| **id != active.user.id)
                .map(|(id, participant)| (id.clone(), participant.clone()));
            Self::membership_change(active, opponent, &room)
        };

        match change {
            MembershipChange::Joined(user_id, display_name, position) => {
                events.push(SessionEvent::OpponentJoined {
                    user_id,
                    display_name,
                    position,
                });
            }
            MembershipChange::Lost(user_id) => {
                events.push(SessionEvent::OpponentLeft {
                    user_id: user_id.clone(),
                });
                self.recover_after_disconnect(&room, &user_id).await?;
                // The rest of this snapshot is pre-recovery state; the
                // repair update re-fires with the fresh offer.
                return Ok(false);
            }
            MembershipChange::CreatorGone => {
                // The record outlived its creator; clean it up on the
                // way out.
                if let Some(active) = self.active.as_ref() {
                    self.store.remove(&active.room_path).await?;
                }
                return Ok(true);
            }
            MembershipChange::None => {}
        }

        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };
        let was_connected = active.handshake.is_connected();

        if let Some(offer) = room.offer() {
            if let Some(HandshakeAction::ApplyRemoteOffer(offer)) = active
                .handshake
                .apply(HandshakeInput::RemoteOffer(offer.clone()))
            {
                match Self::answer_offer(&mut active.transport, offer).await {
                    Ok(answer) => {
                        self.store
                            .write(
                                &active.room_path.child("answer"),
                                serde_json::to_value(&answer)?,
                            )
                            .await?;
                        active.handshake.apply(HandshakeInput::AnswerPublished);
                    }
                    Err(err) => tracing::warn!(%err, "failed to answer remote offer"),
                }
            }
        }

        if let Some(answer) = room.answer() {
            if let Some(HandshakeAction::ApplyRemoteAnswer(answer)) = active
                .handshake
                .apply(HandshakeInput::RemoteAnswer(answer.clone()))
            {
                if let Err(err) = active.transport.set_remote_description(answer).await {
                    tracing::warn!(%err, "failed to apply remote answer");
                }
            }
        }

        if !was_connected && active.handshake.is_connected() {
            events.push(SessionEvent::HandshakeConnected);
        }

        // Candidates only make sense once the remote description is in
        // place for the local role.
        let remote_ready = matches!(
            (active.handshake.role(), active.handshake.state()),
            (HandshakeRole::Initiator, HandshakeState::Connected)
                | (HandshakeRole::Responder, HandshakeState::HasRemoteOffer)
                | (HandshakeRole::Responder, HandshakeState::Connected)
        );
        if remote_ready {
            if let Some(remote) = active.remote_user.clone() {
                let queued = room.candidates_for(&remote);
                let applied = active.applied_candidates.entry(remote).or_insert(0);
                for candidate in queued.iter().skip(*applied) {
                    if let Err(err) = active.transport.add_ice_candidate((*candidate).clone()).await
                    {
                        tracing::warn!(%err, "failed to apply remote candidate");
                    }
                    *applied += 1;
                }
            }
        }

        if room.timer_started() && active.timer.start() {
            events.push(SessionEvent::TimerStarted);
        }

        Ok(false)
    }

    fn membership_change(
        active: &mut ActiveRoom,
        opponent: Option<(UserId, RoomParticipant)>,
        room: &Room,
    ) -> MembershipChange {
        match (active.remote_user.clone(), opponent) {
            (None, Some((user_id, participant))) => {
                active.remote_user = Some(user_id.clone());
                MembershipChange::Joined(
                    user_id,
                    participant.display_name().to_string(),
                    participant.position,
                )
            }
            (Some(known), None) => {
                active.remote_user = None;
                active.applied_candidates.remove(&known);
                if known == *room.created_by() {
                    MembershipChange::CreatorGone
                } else {
                    MembershipChange::Lost(known)
                }
            }
            _ => MembershipChange::None,
        }
    }

    /// Survivor-side repair after an ungraceful opponent loss: the
    /// disconnect hook only removed their membership entry, so the
    /// survivor re-derives the counters and side flags, clears the
    /// stale signaling state, and publishes a fresh offer for the next
    /// joiner.
    async fn recover_after_disconnect(&mut self, room: &Room, gone: &UserId) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        tracing::info!(room = %active.room_id, user = %gone, "recovering after opponent disconnect");

        let mut survivor_view = room.clone();
        survivor_view.reconcile();

        let mut changes = vec![
            (
                active.room_path.child("participantCount"),
                Some(json!(survivor_view.participant_count())),
            ),
            (
                active.room_path.child(Position::For.taken_field()),
                Some(json!(survivor_view.for_taken())),
            ),
            (
                active.room_path.child(Position::Against.taken_field()),
                Some(json!(survivor_view.against_taken())),
            ),
            (active.room_path.child("candidates"), None),
            (active.room_path.child("answer"), None),
        ];

        active.transport.close();
        active.transport = self.transports.create(&self.config.ice_servers);
        active.transport.attach_media(&active.media);
        active.handshake = Handshake::new(HandshakeRole::Initiator);
        active.applied_candidates.clear();

        match Self::initial_offer(&mut active.transport).await {
            Ok(offer) => {
                changes.push((
                    active.room_path.child("offer"),
                    Some(serde_json::to_value(&offer)?),
                ));
                active.handshake.apply(HandshakeInput::OfferPublished);
            }
            Err(err) => {
                tracing::warn!(%err, "failed to renegotiate after opponent loss");
                changes.push((active.room_path.child("offer"), None));
            }
        }

        self.store.update(changes).await?;
        Ok(())
    }

    async fn initial_offer(transport: &mut Box<dyn PeerTransport>) -> Result<SessionDescription> {
        let offer = transport.create_offer().await?;
        transport.set_local_description(offer.clone()).await?;
        Ok(offer)
    }

    async fn answer_offer(
        transport: &mut Box<dyn PeerTransport>,
        offer: SessionDescription,
    ) -> std::result::Result<SessionDescription, TransportError> {
        transport.set_remote_description(offer).await?;
        let answer = transport.create_answer().await?;
        transport.set_local_description(answer.clone()).await?;
        Ok(answer)
    }

    // ===== Local media =====

    /// Toggle the microphone; `None` when not in a room.
    pub fn toggle_audio(&mut self) -> Option<bool> {
        self.active.as_mut().map(|active| active.media.toggle_audio())
    }

    /// Toggle the camera; `None` when not in a room.
    pub fn toggle_video(&mut self) -> Option<bool> {
        self.active.as_mut().map(|active| active.media.toggle_video())
    }

    pub fn local_media(&self) -> Option<&LocalMedia> {
        self.active.as_ref().map(|active| &active.media)
    }

    // ===== Introspection =====

    pub fn is_in_room(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_room(&self) -> Option<&RoomId> {
        self.active.as_ref().map(|active| &active.room_id)
    }

    pub fn handshake_state(&self) -> Option<HandshakeState> {
        self.active.as_ref().map(|active| active.handshake.state())
    }

    pub fn timer(&self) -> Option<&DebateTimer> {
        self.active.as_ref().map(|active| &active.timer)
    }

    fn room_path(&self, room_id: &RoomId) -> StorePath {
        self.config.rooms_root.child(room_id.as_str())
    }

    fn signed_in(&self) -> Result<UserProfile> {
        self.identity.current_user().ok_or(SessionError::NotSignedIn)
    }
}
