use thiserror::Error;

/// Failure of a single round trip or control call against the relay.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Failure reported by a [`PeerConnection`](crate::PeerConnection)
/// implementation.
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("peer connection failure: {0}")]
    Engine(#[from] anyhow::Error),

    #[error("invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    #[error("data channel closed")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("failed to join room: {0}")]
    Join(#[source] TransportError),

    #[error("peer connection went away before a data channel opened")]
    PeerGone,
}
