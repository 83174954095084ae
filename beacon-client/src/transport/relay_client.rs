use crate::error::TransportError;
use async_trait::async_trait;
use beacon_core::{ControlRequest, ErrorBody, PeerId, PollRequest, PollResponse, Room, RoomId};
use reqwest::Response;
use serde_json::Value;
use tracing::info;

/// The one round trip the polling loop needs from a relay.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn poll(&self, request: &PollRequest) -> Result<PollResponse, TransportError>;
}

/// HTTP client for one identity in one room of a relay.
#[derive(Clone)]
pub struct RelayClient {
    base_url: String,
    room: RoomId,
    id: PeerId,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, room: RoomId, id: PeerId) -> Self {
        Self::with_http(base_url, room, id, reqwest::Client::new())
    }

    pub fn with_http(
        base_url: impl Into<String>,
        room: RoomId,
        id: PeerId,
        http: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            room,
            id,
            http,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub async fn create(&self) -> Result<Room, TransportError> {
        self.control("create").await
    }

    pub async fn join(&self) -> Result<Room, TransportError> {
        self.control("join").await
    }

    pub async fn bye(&self) -> Result<Room, TransportError> {
        self.control("bye").await
    }

    /// Appends `message` (when given) and fetches everything after `last`.
    pub async fn exchange(
        &self,
        message: Option<Value>,
        last: u64,
    ) -> Result<PollResponse, TransportError> {
        self.poll(&PollRequest {
            room: self.room.clone(),
            message,
            last,
        })
        .await
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/{}", self.base_url, op)
    }

    async fn control(&self, op: &str) -> Result<Room, TransportError> {
        let body = ControlRequest {
            room: self.room.clone(),
            id: self.id.clone(),
        };
        let response = self.http.post(self.endpoint(op)).json(&body).send().await?;
        let room: Room = decode(response).await?;
        info!("{} {} room {}: {:?}", self.id, op, self.room, room.members);
        Ok(room)
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn poll(&self, request: &PollRequest) -> Result<PollResponse, TransportError> {
        let response = self.http.post(self.endpoint("")).json(request).send().await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(TransportError::Rejected {
        status: status.as_u16(),
        message,
    })
}
