#![allow(dead_code)]

pub mod mock_transport;

use debate_session_core::{Position, RoomDraft, RoomId};
use debate_session_p2p::{
    DebateSession, MemoryStore, SessionConfig, SessionEvent, StaticIdentity, StorePath, SyncStore,
    UserProfile,
};
use self::mock_transport::{MockMedia, MockTransportFactory};
use std::sync::Arc;

pub fn draft(topic: &str, position: Position) -> RoomDraft {
    RoomDraft {
        topic: topic.to_string(),
        category: "politics".to_string(),
        position: Some(position),
        duration_minutes: 10,
    }
}

/// Install the fmt subscriber once so failing runs show the session's
/// tracing output under `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A session for `uid` over the shared store, with mock transport and
/// always-granting mock media.
pub fn session(
    store: &MemoryStore,
    transports: &Arc<MockTransportFactory>,
    uid: &str,
) -> DebateSession {
    init_tracing();
    DebateSession::new(
        Arc::new(store.clone()),
        transports.clone(),
        Arc::new(MockMedia::granting()),
        Arc::new(StaticIdentity::new(UserProfile::new(
            uid,
            format!("{uid}@example.com"),
        ))),
        SessionConfig::default(),
    )
}

pub fn room_path(room_id: &RoomId) -> StorePath {
    StorePath::new("rooms").child(room_id.as_str())
}

pub async fn read_room(store: &MemoryStore, room_id: &RoomId) -> Option<serde_json::Value> {
    store.read(&room_path(room_id)).await.unwrap()
}

/// Poll both sessions alternately until the exchange settles,
/// collecting everything seen along the way. Store deliveries are
/// synchronous, so a handful of rounds always drains an offer/answer
/// plus candidate exchange.
pub async fn pump(
    a: &mut DebateSession,
    b: &mut DebateSession,
) -> (Vec<SessionEvent>, Vec<SessionEvent>) {
    let mut all_a = Vec::new();
    let mut all_b = Vec::new();
    for _ in 0..8 {
        all_a.extend(a.poll().await.unwrap());
        all_b.extend(b.poll().await.unwrap());
    }
    (all_a, all_b)
}
