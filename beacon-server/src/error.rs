use beacon_core::{ErrorBody, RoomId};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failure of the keyed store backing rooms and messages.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("stored record is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("unknown room:{0}")]
    UnknownRoom(RoomId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error surfaced by the HTTP layer. Client mistakes map to 400 with a
/// structured body, store failures to 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("unknown room:{0}")]
    UnknownRoom(RoomId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::UnknownRoom(room) => ApiError::UnknownRoom(room),
            RoomError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                },
            ),
            ApiError::UnknownRoom(room) => (StatusCode::BAD_REQUEST, ErrorBody::unknown_room(room)),
            ApiError::Store(e) => {
                error!("Store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "store failure".to_owned(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
