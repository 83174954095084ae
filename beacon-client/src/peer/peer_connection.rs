use crate::error::PeerError;
use async_trait::async_trait;
use beacon_core::Candidate;
use bytes::Bytes;
use std::sync::Arc;

/// Local session description together with the ICE candidates gathered
/// while producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDescription {
    pub sdp: String,
    pub candidates: Vec<Candidate>,
}

/// Notifications a [`PeerConnection`] pushes to whoever negotiates for it.
pub enum PeerEvent {
    /// A data channel finished opening and can carry bytes.
    ChannelOpen(Arc<dyn DataChannel>),
    /// The connection failed or was closed.
    Closed,
}

/// SDP/ICE engine the negotiator drives.
///
/// Description calls block until candidate gathering completes, so the
/// returned [`LocalDescription`] carries the full candidate list. Channel and
/// connection notifications arrive on the event receiver handed out when the
/// implementation is constructed.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Opens a local data channel and produces an offer.
    async fn create_offer(&self) -> Result<LocalDescription, PeerError>;

    /// Applies a remote offer and produces the answer.
    async fn create_answer(&self, remote_offer: &str) -> Result<LocalDescription, PeerError>;

    async fn set_remote_answer(&self, remote_answer: &str) -> Result<(), PeerError>;

    async fn add_candidate(&self, candidate: &Candidate) -> Result<(), PeerError>;

    async fn close(&self) -> Result<(), PeerError>;
}

/// Byte-oriented channel to the remote peer.
#[async_trait]
pub trait DataChannel: Send + Sync {
    async fn send(&self, data: Bytes) -> Result<(), PeerError>;

    /// Next inbound message, or `None` once the channel closed.
    async fn recv(&self) -> Option<Bytes>;

    async fn close(&self);
}
