use crate::infrastructure::error::Result;
use crate::infrastructure::store::{StorePath, Subscription, SyncStore};
use debate_session_core::{Position, Room, RoomId, Timestamp, UserId};
use std::sync::Arc;

/// One joinable room as shown in the lobby list.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRoom {
    pub id: RoomId,
    pub topic: String,
    pub category: String,
    pub duration_minutes: u32,
    pub creator_name: String,
    /// The side still free for a joiner.
    pub open_position: Position,
    pub created_at: Timestamp,
}

/// Read-side view over the `rooms` subtree: which rooms are waiting for
/// an opponent.
#[derive(Clone)]
pub struct RoomDirectory {
    store: Arc<dyn SyncStore>,
    rooms_root: StorePath,
}

impl RoomDirectory {
    pub fn new(store: Arc<dyn SyncStore>, rooms_root: StorePath) -> Self {
        Self { store, rooms_root }
    }

    /// Rooms a given viewer could join right now, newest first. Full
    /// rooms and the viewer's own rooms are filtered out; records that
    /// do not parse as rooms are skipped.
    pub async fn list_open(&self, viewer: Option<&UserId>) -> Result<Vec<OpenRoom>> {
        let snapshot = self.store.read(&self.rooms_root).await?;
        let Some(value) = snapshot else {
            return Ok(Vec::new());
        };
        let Some(records) = value.as_object() else {
            return Ok(Vec::new());
        };

        let mut open = Vec::new();
        for (key, record) in records {
            let room: Room = match serde_json::from_value(record.clone()) {
                Ok(room) => room,
                Err(err) => {
                    tracing::warn!(room = %key, %err, "skipping malformed room record");
                    continue;
                }
            };
            if viewer.is_some_and(|user| user == room.created_by()) {
                continue;
            }
            let Some(open_position) = room.available_position() else {
                continue;
            };
            let creator_name = room
                .creator_email()
                .split('@')
                .next()
                .unwrap_or(room.creator_email())
                .to_string();
            open.push(OpenRoom {
                id: RoomId::new(key.clone()),
                topic: room.topic().to_string(),
                category: room.category().to_string(),
                duration_minutes: room.duration_minutes(),
                creator_name,
                open_position,
                created_at: room.created_at(),
            });
        }

        open.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(open)
    }

    /// Live watch on the whole `rooms` subtree, for lobby refreshes.
    pub fn watch(&self) -> Subscription {
        self.store.subscribe(&self.rooms_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryStore;
    use debate_session_core::RoomDraft;
    use serde_json::json;

    fn root() -> StorePath {
        StorePath::new("rooms")
    }

    async fn seed_room(store: &MemoryStore, key: &str, creator: &str, created_at: u64) {
        let draft = RoomDraft {
            topic: format!("topic by {creator}"),
            category: "politics".to_string(),
            position: Some(Position::For),
            duration_minutes: 10,
        };
        let mut value = serde_json::to_value(
            Room::create(draft, UserId::new(creator), format!("{creator}@example.com")).unwrap(),
        )
        .unwrap();
        value["createdAt"] = json!(created_at);
        store.write(&root().child(key), value).await.unwrap();
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = MemoryStore::new();
        let directory = RoomDirectory::new(Arc::new(store), root());
        assert!(directory.list_open(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_open_rooms_newest_first() {
        let store = MemoryStore::new();
        seed_room(&store, "r1", "alice", 100).await;
        seed_room(&store, "r2", "bob", 200).await;

        let directory = RoomDirectory::new(Arc::new(store), root());
        let open = directory.list_open(None).await.unwrap();

        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, RoomId::new("r2"));
        assert_eq!(open[0].creator_name, "bob");
        assert_eq!(open[0].open_position, Position::Against);
        assert_eq!(open[1].id, RoomId::new("r1"));
    }

    #[tokio::test]
    async fn filters_own_and_full_rooms() {
        let store = MemoryStore::new();
        seed_room(&store, "mine", "alice", 100).await;
        seed_room(&store, "open", "bob", 200).await;
        seed_room(&store, "full", "carol", 300).await;
        store
            .write(
                &root().child("full").child("participants").child("dave"),
                json!({"email": "dave@example.com", "position": "against", "joined": 301}),
            )
            .await
            .unwrap();

        let directory = RoomDirectory::new(Arc::new(store), root());
        let viewer = UserId::new("alice");
        let open = directory.list_open(Some(&viewer)).await.unwrap();

        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, RoomId::new("open"));
    }

    #[tokio::test]
    async fn skips_malformed_records() {
        let store = MemoryStore::new();
        seed_room(&store, "good", "bob", 100).await;
        store
            .write(&root().child("junk"), json!({"topic": "no other fields"}))
            .await
            .unwrap();

        let directory = RoomDirectory::new(Arc::new(store), root());
        let open = directory.list_open(None).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, RoomId::new("good"));
    }
}
