use crate::error::PeerError;
use crate::peer::{DataChannel, LocalDescription, PeerConnection, PeerEvent, RtcConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use beacon_core::Candidate;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// [`PeerConnection`] backed by webrtc-rs.
pub struct RtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    gathered: CandidateLog,
    events: mpsc::Sender<PeerEvent>,
    channel_label: String,
}

impl RtcPeer {
    /// Builds the connection and returns it with the receiver of its
    /// [`PeerEvent`]s.
    pub async fn new(config: RtcConfig) -> Result<(Self, mpsc::Receiver<PeerEvent>)> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let (events, events_rx) = mpsc::channel(16);
        let gathered = CandidateLog::default();

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    if matches!(
                        s,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx.send(PeerEvent::Closed).await;
                    }
                })
            },
        ));

        let ice_sink = gathered.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let sink = ice_sink.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    debug!("ICE gathering complete");
                    return;
                };
                match candidate.to_json() {
                    Ok(init) => sink.push(from_init(init)).await,
                    Err(e) => warn!("Dropping unserializable local candidate: {}", e),
                }
            })
        }));

        let dc_tx = events.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            Box::pin(async move {
                debug!("Remote opened data channel '{}'", dc.label());
                watch_channel(dc, tx);
            })
        }));

        let peer = Self {
            peer_connection,
            gathered,
            events,
            channel_label: config.channel_label,
        };
        Ok((peer, events_rx))
    }

    /// Sets `description` as local and waits until ICE gathering completes.
    async fn settle_local(&self, description: RTCSessionDescription) -> Result<LocalDescription> {
        let sdp = description.sdp.clone();
        self.gathered.restart().await;
        let mut gathering = self.peer_connection.gathering_complete_promise().await;
        self.peer_connection
            .set_local_description(description)
            .await
            .context("Failed to set local description")?;
        let _ = gathering.recv().await;

        let candidates = self.gathered.snapshot().await;
        info!("Gathered {} local candidate(s)", candidates.len());
        Ok(LocalDescription { sdp, candidates })
    }
}

#[async_trait]
impl PeerConnection for RtcPeer {
    async fn create_offer(&self) -> Result<LocalDescription, PeerError> {
        let dc = self
            .peer_connection
            .create_data_channel(&self.channel_label, None)
            .await
            .context("Failed to create data channel")?;
        watch_channel(dc, self.events.clone());

        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        Ok(self.settle_local(offer).await?)
    }

    async fn create_answer(&self, remote_offer: &str) -> Result<LocalDescription, PeerError> {
        let offer = RTCSessionDescription::offer(remote_offer.to_owned())
            .context("Remote offer is not valid SDP")?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to apply remote offer")?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        Ok(self.settle_local(answer).await?)
    }

    async fn set_remote_answer(&self, remote_answer: &str) -> Result<(), PeerError> {
        let answer = RTCSessionDescription::answer(remote_answer.to_owned())
            .context("Remote answer is not valid SDP")?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .context("Failed to apply remote answer")?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: &Candidate) -> Result<(), PeerError> {
        if candidate.candidate.is_empty() {
            return Err(PeerError::InvalidCandidate("empty candidate".to_owned()));
        }
        self.peer_connection
            .add_ice_candidate(to_init(candidate))
            .await
            .map_err(|e| PeerError::InvalidCandidate(e.to_string()))
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}

/// Candidates gathered for the most recent local description.
#[derive(Clone, Default)]
struct CandidateLog(Arc<Mutex<Vec<Candidate>>>);

impl CandidateLog {
    /// Forgets candidates of any earlier description.
    async fn restart(&self) {
        self.0.lock().await.clear();
    }

    async fn push(&self, candidate: Candidate) {
        self.0.lock().await.push(candidate);
    }

    async fn snapshot(&self) -> Vec<Candidate> {
        self.0.lock().await.clone()
    }
}

fn from_init(init: RTCIceCandidateInit) -> Candidate {
    Candidate {
        candidate: init.candidate,
        sdp_m_line_index: init.sdp_mline_index.unwrap_or_default(),
        sdp_mid: init.sdp_mid.unwrap_or_default(),
    }
}

fn to_init(candidate: &Candidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate.clone(),
        sdp_mid: (!candidate.sdp_mid.is_empty()).then(|| candidate.sdp_mid.clone()),
        sdp_mline_index: Some(candidate.sdp_m_line_index),
        username_fragment: None,
    }
}

/// Wires message and lifecycle callbacks of `dc` and announces it on
/// `events` once open.
fn watch_channel(dc: Arc<RTCDataChannel>, events: mpsc::Sender<PeerEvent>) {
    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let inbound_tx = Arc::new(std::sync::Mutex::new(Some(inbound_tx)));
    let channel = Arc::new(RtcChannel {
        dc: dc.clone(),
        inbound: Mutex::new(inbound_rx),
    });

    dc.on_open(Box::new(move || {
        let tx = events.clone();
        let ready = channel.clone();
        Box::pin(async move {
            info!("Data channel '{}' open", ready.dc.label());
            let _ = tx.send(PeerEvent::ChannelOpen(ready)).await;
        })
    }));

    let msg_tx = inbound_tx.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = msg_tx.lock().ok().and_then(|slot| slot.clone());
        Box::pin(async move {
            if let Some(tx) = tx {
                let _ = tx.send(msg.data).await;
            }
        })
    }));

    let close_tx = inbound_tx;
    dc.on_close(Box::new(move || {
        if let Ok(mut slot) = close_tx.lock() {
            slot.take();
        }
        Box::pin(async move {
            info!("Data channel closed");
        })
    }));
}

struct RtcChannel {
    dc: Arc<RTCDataChannel>,
    inbound: Mutex<mpsc::Receiver<Bytes>>,
}

#[async_trait]
impl DataChannel for RtcChannel {
    async fn send(&self, data: Bytes) -> Result<(), PeerError> {
        self.dc
            .send(&data)
            .await
            .context("Data channel send failed")?;
        Ok(())
    }

    async fn recv(&self) -> Option<Bytes> {
        self.inbound.lock().await.recv().await
    }

    async fn close(&self) {
        if let Err(e) = self.dc.close().await {
            warn!("Failed to close data channel: {}", e);
        }
    }
}
