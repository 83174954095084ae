use crate::error::NegotiationError;
use crate::negotiation::{Action, Event, NegotiatorConfig, Session};
use crate::peer::{DataChannel, PeerConnection, PeerEvent, PeerStream};
use crate::transport::{Dispatch, RelayClient, SignalingTransport};
use beacon_core::{Candidate, Envelope, PeerId, Signal};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives one [`PeerConnection`] through the offer/answer exchange over a
/// relay room until a data channel opens.
///
/// There is no internal deadline. Wrap [`open`](Self::open) in a timeout if
/// the remote peer may never show up.
pub struct Negotiator {
    relay: RelayClient,
    peer: Arc<dyn PeerConnection>,
    peer_events: mpsc::Receiver<PeerEvent>,
    config: NegotiatorConfig,
}

impl Negotiator {
    pub fn new(
        relay: RelayClient,
        peer: Arc<dyn PeerConnection>,
        peer_events: mpsc::Receiver<PeerEvent>,
        config: NegotiatorConfig,
    ) -> Self {
        Self {
            relay,
            peer,
            peer_events,
            config,
        }
    }

    /// Joins the room and negotiates until the data channel opens.
    ///
    /// Failing to join, or the connection closing first, is fatal. Every
    /// other failure only discards the envelope or step involved.
    pub async fn open(self) -> Result<PeerStream, NegotiationError> {
        let Negotiator {
            relay,
            peer,
            mut peer_events,
            config,
        } = self;

        relay.join().await.map_err(NegotiationError::Join)?;

        let (inbound_tx, mut inbound) = mpsc::unbounded_channel::<Value>();
        let mut run = Run {
            relay,
            peer,
            config,
            dispatch: Some(Box::new(move |message: Value| {
                let _ = inbound_tx.send(message);
            })),
            transport: None,
            opened: None,
        };
        let mut session = Session::new(run.config.role, run.config.candidates.clone());
        let mut pending = VecDeque::from([Event::Joined]);

        loop {
            while let Some(event) = pending.pop_front() {
                for action in session.step(event) {
                    if let Some(stream) = run.execute(action, &mut pending).await {
                        return Ok(stream);
                    }
                }
            }

            tokio::select! {
                Some(message) = inbound.recv() => {
                    if let Some(event) = run.decode(message) {
                        pending.push_back(event);
                    }
                }
                event = peer_events.recv() => match event {
                    Some(PeerEvent::ChannelOpen(channel)) => {
                        run.opened = Some(channel);
                        pending.push_back(Event::ChannelOpen);
                    }
                    Some(PeerEvent::Closed) | None => {
                        warn!("Peer connection closed in state {:?}", session.state());
                        run.abort().await;
                        return Err(NegotiationError::PeerGone);
                    }
                }
            }
        }
    }
}

/// Side-effect half of a negotiation.
struct Run {
    relay: RelayClient,
    peer: Arc<dyn PeerConnection>,
    config: NegotiatorConfig,
    dispatch: Option<Dispatch>,
    transport: Option<SignalingTransport>,
    opened: Option<Arc<dyn DataChannel>>,
}

impl Run {
    fn me(&self) -> &PeerId {
        self.relay.id()
    }

    /// Runs one action. Returns the stream once the session completes.
    async fn execute(
        &mut self,
        action: Action,
        pending: &mut VecDeque<Event>,
    ) -> Option<PeerStream> {
        match action {
            Action::StartTransport => {
                if let Some(dispatch) = self.dispatch.take() {
                    self.transport = Some(SignalingTransport::start(
                        Arc::new(self.relay.clone()),
                        self.relay.room().clone(),
                        self.config.transport.clone(),
                        dispatch,
                    ));
                }
            }
            Action::Send { to, signal } => self.send(to, &signal).await,
            Action::SendCandidates { to, candidates } => {
                self.send_candidates(&to, candidates).await
            }
            Action::CreateOffer { peer } => {
                info!("Offering to {}", peer);
                let event = match self.peer.create_offer().await {
                    Ok(local) => Event::DescriptionReady { peer, local },
                    Err(e) => Event::DescriptionFailed {
                        peer,
                        reason: e.to_string(),
                    },
                };
                self.note_failure(&event);
                pending.push_back(event);
            }
            Action::CreateAnswer { peer, offer } => {
                info!("Answering offer from {}", peer);
                let event = match self.peer.create_answer(&offer).await {
                    Ok(local) => Event::DescriptionReady { peer, local },
                    Err(e) => Event::DescriptionFailed {
                        peer,
                        reason: e.to_string(),
                    },
                };
                self.note_failure(&event);
                pending.push_back(event);
            }
            Action::ApplyAnswer { sdp } => {
                if let Err(e) = self.peer.set_remote_answer(&sdp).await {
                    warn!("Discarding answer that could not be applied: {}", e);
                }
            }
            Action::AddCandidate(candidate) => {
                if let Err(e) = self.peer.add_candidate(&candidate).await {
                    warn!("Discarding candidate {:?}: {}", candidate.candidate, e);
                }
            }
            Action::Complete => return self.complete().await,
        }
        None
    }

    fn note_failure(&self, event: &Event) {
        if let Event::DescriptionFailed { peer, reason } = event {
            warn!("Negotiation with {} failed: {}", peer, reason);
        }
    }

    async fn send(&self, to: PeerId, signal: &Signal) {
        let Some(transport) = &self.transport else {
            warn!("Dropping {} to {}: transport not started", signal.kind(), to);
            return;
        };
        debug!("Sending {} to {}", signal.kind(), to);
        let envelope = Envelope::new(self.me().clone(), to, signal);
        match serde_json::to_value(&envelope) {
            Ok(payload) => transport.send(payload).await,
            Err(e) => warn!("Dropping unencodable {}: {}", signal.kind(), e),
        }
    }

    async fn send_candidates(&self, to: &PeerId, candidates: Vec<Candidate>) {
        info!("Sending {} candidate(s) to {}", candidates.len(), to);
        for (i, candidate) in candidates.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.candidates.pacing).await;
            }
            self.send(to.clone(), &Signal::Candidate(candidate)).await;
        }
    }

    /// Turns a relayed message into an event, dropping anything not meant
    /// for us or not understood.
    fn decode(&self, message: Value) -> Option<Event> {
        let envelope = match Envelope::from_value(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping undecodable envelope: {}", e);
                return None;
            }
        };
        if !envelope.accepted_by(self.me()) {
            return None;
        }
        match envelope.signal() {
            Ok(signal) => {
                debug!("Received {} from {}", signal.kind(), envelope.sender);
                Some(Event::Received {
                    from: envelope.sender,
                    signal,
                })
            }
            Err(e) => {
                warn!("Dropping envelope from {}: {}", envelope.sender, e);
                None
            }
        }
    }

    async fn complete(&mut self) -> Option<PeerStream> {
        let channel = self.opened.take()?;
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
        if let Err(e) = self.relay.bye().await {
            warn!("Failed to leave room {}: {}", self.relay.room(), e);
        }
        info!("Connected in room {}", self.relay.room());
        Some(PeerStream::new(channel))
    }

    async fn abort(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
        if let Err(e) = self.peer.close().await {
            debug!("Closing peer connection: {}", e);
        }
    }
}
