use crate::error::ApiError;
use crate::signaling::SignalingService;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use beacon_core::{ControlRequest, PollRequest, PollResponse, Room};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

fn parse<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejecting malformed body: {}", e);
        ApiError::BadRequest(e.to_string())
    })
}

pub async fn create(
    State(service): State<SignalingService>,
    body: Bytes,
) -> Result<Json<Room>, ApiError> {
    let req: ControlRequest = parse(&body)?;
    let room = service.rooms.create_or_reset(&req.room, &req.id).await?;
    Ok(Json(room))
}

pub async fn join(
    State(service): State<SignalingService>,
    body: Bytes,
) -> Result<Json<Room>, ApiError> {
    let req: ControlRequest = parse(&body)?;
    let room = service.rooms.join(&req.room, &req.id).await?;
    Ok(Json(room))
}

pub async fn bye(
    State(service): State<SignalingService>,
    body: Bytes,
) -> Result<Json<Room>, ApiError> {
    let req: ControlRequest = parse(&body)?;
    let room = service.rooms.leave(&req.room, &req.id).await?;
    Ok(Json(room))
}

/// Send and receive coalesced into one round trip: an optional append
/// followed by a fetch from the caller's cursor.
pub async fn poll(
    State(service): State<SignalingService>,
    body: Bytes,
) -> Result<Json<PollResponse>, ApiError> {
    let req: PollRequest = parse(&body)?;

    if let Some(message) = &req.message {
        service.rooms.append_message(&req.room, message).await?;
    }
    let fetched = service.rooms.fetch_since(&req.room, req.last).await?;

    debug!(
        "Poll on room {} from {}: {} message(s), last {}",
        req.room,
        req.last,
        fetched.messages.len(),
        fetched.last
    );

    Ok(Json(PollResponse {
        room: req.room,
        messages: fetched.messages,
        last: fetched.last,
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
