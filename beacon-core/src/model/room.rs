use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Default, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership record of a room together with the bounds of its message log.
///
/// `read_pos` is the highest sequence known to be gone from the log for
/// every reader; `write_pos` is the last sequence handed out. A deleted room
/// is reported with an empty `room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room: RoomId,
    pub owner: PeerId,
    #[serde(default)]
    pub members: Vec<PeerId>,
    #[serde(default)]
    pub read_pos: u64,
    #[serde(default)]
    pub write_pos: u64,
}

impl Room {
    pub fn new(room: RoomId, owner: PeerId) -> Self {
        Self {
            room,
            owner,
            members: Vec::new(),
            read_pos: 0,
            write_pos: 0,
        }
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.members.contains(id)
    }

    /// Returns false when the id was already a member.
    pub fn add_member(&mut self, id: PeerId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Returns false when the id was not a member.
    pub fn remove_member(&mut self, id: &PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        before != self.members.len()
    }

    pub fn is_deleted(&self) -> bool {
        self.room.0.is_empty()
    }
}
