mod support;

use debate_session_core::{Position, RoomError, RoomId, SdpType, UserId};
use debate_session_p2p::{
    DebateSession, MemoryStore, RoomDirectory, SessionConfig, SessionError, SessionEvent,
    StaticIdentity, StorePath, UserProfile,
};
use std::sync::Arc;
use support::mock_transport::{MockMedia, MockTransportFactory};
use support::{draft, pump, read_room, session};

#[tokio::test]
async fn create_room_publishes_record_and_offer() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");

    let room_id = alice
        .create_room(draft("Homework should be banned", Position::For))
        .await
        .unwrap();

    assert!(alice.is_in_room());
    assert_eq!(alice.current_room(), Some(&room_id));

    let record = read_room(&store, &room_id).await.unwrap();
    assert_eq!(record["createdBy"], "alice");
    assert_eq!(record["creatorEmail"], "alice@example.com");
    assert_eq!(record["participantCount"], 1);
    assert_eq!(record["forTaken"], true);
    assert_eq!(record["againstTaken"], false);
    assert_eq!(record["timerStarted"], false);
    assert_eq!(record["offer"]["type"], "offer");

    let transport = transports.latest();
    let local = transport.local_description().unwrap();
    assert_eq!(local.sdp_type, SdpType::Offer);
    assert!(transport.attached_stream().is_some());
}

#[tokio::test]
async fn create_room_rejects_invalid_draft() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");

    let result = alice.create_room(draft("   ", Position::For)).await;
    assert!(matches!(
        result,
        Err(SessionError::Room(RoomError::EmptyTopic))
    ));
    assert!(!alice.is_in_room());
    // Validation happens before anything touches the store.
    assert_eq!(store.snapshot(), serde_json::Value::Null);
}

#[tokio::test]
async fn denied_camera_removes_the_half_created_room() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = DebateSession::new(
        Arc::new(store.clone()),
        transports.clone(),
        Arc::new(MockMedia::denying()),
        Arc::new(StaticIdentity::new(UserProfile::new(
            "alice",
            "alice@example.com",
        ))),
        SessionConfig::default(),
    );

    let result = alice.create_room(draft("Topic", Position::For)).await;

    assert!(matches!(result, Err(SessionError::Media(_))));
    assert!(!alice.is_in_room());
    // No orphan record survives the failed create.
    assert_eq!(store.snapshot(), serde_json::Value::Null);
}

#[tokio::test]
async fn join_takes_the_open_side() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");
    let mut bob = session(&store, &transports, "bob");

    let room_id = alice
        .create_room(draft("Topic", Position::For))
        .await
        .unwrap();
    let position = bob.join_room(&room_id).await.unwrap();

    assert_eq!(position, Position::Against);

    let record = read_room(&store, &room_id).await.unwrap();
    assert_eq!(record["participantCount"], 2);
    assert_eq!(record["forTaken"], true);
    assert_eq!(record["againstTaken"], true);
    assert_eq!(
        record["participants"]["bob"]["email"],
        "bob@example.com"
    );

    let (alice_events, bob_events) = pump(&mut alice, &mut bob).await;
    assert!(alice_events.iter().any(|event| matches!(
        event,
        SessionEvent::OpponentJoined { user_id, position: Position::Against, .. }
            if user_id.as_str() == "bob"
    )));
    assert!(bob_events.iter().any(|event| matches!(
        event,
        SessionEvent::OpponentJoined { user_id, position: Position::For, .. }
            if user_id.as_str() == "alice"
    )));
}

#[tokio::test]
async fn join_missing_room_fails() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut bob = session(&store, &transports, "bob");

    let result = bob.join_room(&RoomId::new("nope")).await;
    assert!(matches!(result, Err(SessionError::RoomNotFound(_))));
    assert!(!bob.is_in_room());
}

#[tokio::test]
async fn third_party_cannot_join_a_full_room() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");
    let mut bob = session(&store, &transports, "bob");
    let mut carol = session(&store, &transports, "carol");

    let room_id = alice
        .create_room(draft("Topic", Position::For))
        .await
        .unwrap();
    bob.join_room(&room_id).await.unwrap();

    let result = carol.join_room(&room_id).await;

    assert!(matches!(
        result,
        Err(SessionError::Room(RoomError::RoomFull))
    ));
    assert!(!carol.is_in_room());
    let record = read_room(&store, &room_id).await.unwrap();
    assert_eq!(record["participants"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn creator_leave_deletes_room_and_closes_opponent() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");
    let mut bob = session(&store, &transports, "bob");

    let room_id = alice
        .create_room(draft("Topic", Position::For))
        .await
        .unwrap();
    bob.join_room(&room_id).await.unwrap();
    pump(&mut alice, &mut bob).await;

    alice.leave_room().await.unwrap();

    assert!(!alice.is_in_room());
    assert!(read_room(&store, &room_id).await.is_none());

    let bob_events = bob.poll().await.unwrap();
    assert!(bob_events.contains(&SessionEvent::RoomClosed));
    assert!(!bob.is_in_room());
}

#[tokio::test]
async fn joiner_leave_deletes_the_two_party_room() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");
    let mut bob = session(&store, &transports, "bob");

    let room_id = alice
        .create_room(draft("Topic", Position::For))
        .await
        .unwrap();
    bob.join_room(&room_id).await.unwrap();
    pump(&mut alice, &mut bob).await;

    // Bob's departure would leave Alice alone; no single-party room
    // may persist.
    bob.leave_room().await.unwrap();

    assert!(read_room(&store, &room_id).await.is_none());
    let alice_events = alice.poll().await.unwrap();
    assert!(alice_events.contains(&SessionEvent::RoomClosed));
    assert!(!alice.is_in_room());
}

#[tokio::test]
async fn lobby_watch_sees_rooms_appear_and_vanish() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");
    let directory = RoomDirectory::new(Arc::new(store.clone()), StorePath::new("rooms"));
    let mut watch = directory.watch();
    watch.drain();

    let room_id = alice
        .create_room(draft("Topic", Position::For))
        .await
        .unwrap();

    assert!(!watch.drain().is_empty());
    let open = directory.list_open(Some(&UserId::new("bob"))).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, room_id);

    alice.leave_room().await.unwrap();

    assert!(!watch.drain().is_empty());
    assert!(directory.list_open(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn leave_without_room_is_a_noop() {
    let store = MemoryStore::new();
    let transports = MockTransportFactory::new();
    let mut alice = session(&store, &transports, "alice");

    alice.leave_room().await.unwrap();
    assert!(!alice.is_in_room());
}
