use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `create`, `join` and `bye`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub room: RoomId,
    pub id: PeerId,
}

/// Body of a poll round trip. A present `message` is appended to the room's
/// log before the fetch; `last` is the caller's cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRequest {
    pub room: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default)]
    pub last: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub room: RoomId,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub last: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn unknown_room(room: &RoomId) -> Self {
        Self {
            error: format!("unknown room:{}", room),
        }
    }
}
