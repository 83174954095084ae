use crate::config::RetentionConfig;
use crate::error::{RoomError, StoreError};
use crate::store::KeyValueStore;
use beacon_core::{PeerId, Room, RoomId};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Messages collected by [`RoomStore::fetch_since`] plus the cursor the
/// caller should present next time.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub messages: Vec<Value>,
    pub last: u64,
}

/// Room membership and the per-room ordered message log, kept in a
/// [`KeyValueStore`].
///
/// Every operation is a read-modify-write of the room record without any
/// cross-request transaction. Two concurrent appends to the same room race
/// and the losing sequence number may be orphaned; entries that expire before
/// anyone fetched them are skipped for good.
#[derive(Clone)]
pub struct RoomStore {
    store: Arc<dyn KeyValueStore>,
    retention: RetentionConfig,
}

fn room_key(room: &RoomId) -> String {
    format!("room:{}", room)
}

fn message_key(room: &RoomId, seq: u64) -> String {
    format!("msg:{}:{}", room, seq)
}

impl RoomStore {
    pub fn new(store: Arc<dyn KeyValueStore>, retention: RetentionConfig) -> Self {
        Self { store, retention }
    }

    async fn load(&self, room: &RoomId) -> Result<Option<Room>, StoreError> {
        match self.store.get(&room_key(room)).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    async fn load_existing(&self, room: &RoomId) -> Result<Room, RoomError> {
        self.load(room)
            .await?
            .ok_or_else(|| RoomError::UnknownRoom(room.clone()))
    }

    async fn save(&self, record: &Room) -> Result<(), StoreError> {
        let raw = Bytes::from(serde_json::to_vec(record)?);
        self.store
            .set(&room_key(&record.room), raw, Some(self.retention.room_ttl))
            .await
    }

    /// Returns the owner's existing room untouched, otherwise replaces
    /// whatever is stored with a fresh empty room.
    pub async fn create_or_reset(&self, room: &RoomId, owner: &PeerId) -> Result<Room, RoomError> {
        let record = match self.load(room).await? {
            Some(existing) if existing.owner == *owner => existing,
            Some(stale) => {
                info!(
                    "Resetting room {} (owner {} replaced by {})",
                    room, stale.owner, owner
                );
                Room::new(room.clone(), owner.clone())
            }
            None => {
                info!("Creating room {} for {}", room, owner);
                Room::new(room.clone(), owner.clone())
            }
        };
        self.save(&record).await?;
        Ok(record)
    }

    pub async fn join(&self, room: &RoomId, id: &PeerId) -> Result<Room, RoomError> {
        let mut record = self.load_existing(room).await?;
        if record.add_member(id.clone()) {
            info!("{} joined room {}", id, room);
        }
        self.save(&record).await?;
        Ok(record)
    }

    /// The owner leaving deletes the room record; its log entries are left
    /// to expire. The returned record then carries an empty room id.
    pub async fn leave(&self, room: &RoomId, id: &PeerId) -> Result<Room, RoomError> {
        let mut record = self.load_existing(room).await?;

        if record.owner == *id {
            self.store.delete(&room_key(room)).await?;
            info!("Owner {} closed room {}", id, room);
            record.room = RoomId::default();
            return Ok(record);
        }

        if record.remove_member(id) {
            info!("{} left room {}", id, room);
            self.save(&record).await?;
        }
        Ok(record)
    }

    /// Appends `payload` to the log and returns its sequence number.
    ///
    /// The room record is persisted before the payload; a failure in between
    /// leaves a sequence with nothing behind it, which readers skip.
    pub async fn append_message(&self, room: &RoomId, payload: &Value) -> Result<u64, RoomError> {
        let mut record = self.load_existing(room).await?;
        record.write_pos += 1;
        let seq = record.write_pos;

        self.save(&record).await?;

        let raw = Bytes::from(serde_json::to_vec(payload).map_err(StoreError::from)?);
        self.store
            .set(&message_key(room, seq), raw, Some(self.retention.message_ttl))
            .await?;

        debug!("Appended message {} to room {}", seq, room);
        Ok(seq)
    }

    /// Collects every surviving entry after `max(read_pos, cursor)`.
    ///
    /// Entries that already expired move the room's `read_pos` past them
    /// permanently. A cursor beyond `write_pos` fetches nothing. The room
    /// record is written back on every call, so a room stays alive for as
    /// long as anyone polls it.
    pub async fn fetch_since(&self, room: &RoomId, cursor: u64) -> Result<Fetched, RoomError> {
        let mut record = self.load_existing(room).await?;
        let begin = record.read_pos.max(cursor.min(record.write_pos));
        let mut messages = Vec::new();

        for seq in (begin..record.write_pos).map(|s| s + 1) {
            match self.store.get(&message_key(room, seq)).await? {
                Some(raw) => {
                    messages.push(serde_json::from_slice(&raw).map_err(StoreError::from)?)
                }
                None => {
                    debug!("Message {} of room {} expired before delivery", seq, room);
                    record.read_pos = seq;
                }
            }
        }

        self.save(&record).await?;

        Ok(Fetched {
            messages,
            last: record.write_pos,
        })
    }
}
