use crate::negotiation::{CandidatePolicy, Role};
use crate::peer::LocalDescription;
use beacon_core::{Candidate, Description, PeerId, Signal};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NegotiationState {
    #[default]
    Idle,
    /// Request broadcast, no peer picked yet.
    AwaitingPeer,
    /// Producing an offer for `peer`.
    Offering { peer: PeerId },
    /// Producing an answer to the offer `peer` sent.
    Answering { peer: PeerId },
    /// Local description sent; candidates flow both ways.
    IceExchanging { peer: PeerId },
    Connected,
}

impl NegotiationState {
    /// Peer this session is negotiating with, if one was picked.
    pub fn peer(&self) -> Option<&PeerId> {
        match self {
            NegotiationState::Offering { peer }
            | NegotiationState::Answering { peer }
            | NegotiationState::IceExchanging { peer } => Some(peer),
            _ => None,
        }
    }
}

/// Inputs to the state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Joined,
    /// An envelope addressed to us, already filtered and decoded.
    Received { from: PeerId, signal: Signal },
    DescriptionReady {
        peer: PeerId,
        local: LocalDescription,
    },
    DescriptionFailed { peer: PeerId, reason: String },
    ChannelOpen,
}

/// Side effects requested by a transition, executed in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    StartTransport,
    Send { to: PeerId, signal: Signal },
    CreateOffer { peer: PeerId },
    CreateAnswer { peer: PeerId, offer: String },
    ApplyAnswer { sdp: String },
    AddCandidate(Candidate),
    /// Trickle these candidates to `to`, one envelope each.
    SendCandidates { to: PeerId, candidates: Vec<Candidate> },
    Complete,
}

/// Computes the next state and its actions. Anything the current state does
/// not expect leaves it unchanged and produces nothing.
pub fn transition(
    state: &NegotiationState,
    role: Role,
    policy: &CandidatePolicy,
    event: Event,
) -> (NegotiationState, Vec<Action>) {
    use NegotiationState as S;

    let unchanged = || (state.clone(), Vec::new());

    match (state, event) {
        (S::Connected, _) => unchanged(),

        (_, Event::ChannelOpen) => (S::Connected, vec![Action::Complete]),

        (S::Idle, Event::Joined) => (
            S::AwaitingPeer,
            vec![
                Action::StartTransport,
                Action::Send {
                    to: PeerId::broadcast(),
                    signal: Signal::Request,
                },
            ],
        ),

        (S::AwaitingPeer, Event::Received { from, signal }) => match signal {
            Signal::Offer(offer) => (
                S::Answering { peer: from.clone() },
                vec![Action::CreateAnswer {
                    peer: from,
                    offer: offer.description,
                }],
            ),
            Signal::Request if role == Role::Offerer => (
                S::Offering { peer: from.clone() },
                vec![Action::CreateOffer { peer: from }],
            ),
            _ => unchanged(),
        },

        (S::Offering { peer }, Event::DescriptionReady { peer: ready, local })
            if *peer == ready =>
        {
            let signal = Signal::Offer(Description::new(local.sdp));
            described(peer, signal, &local.candidates, policy)
        }

        (S::Answering { peer }, Event::DescriptionReady { peer: ready, local })
            if *peer == ready =>
        {
            let signal = Signal::Answer(Description::new(local.sdp));
            described(peer, signal, &local.candidates, policy)
        }

        (
            S::Offering { peer } | S::Answering { peer },
            Event::DescriptionFailed { peer: failed, .. },
        ) if *peer == failed => (S::AwaitingPeer, Vec::new()),

        (
            S::IceExchanging { peer },
            Event::Received {
                from,
                signal: Signal::Answer(answer),
            },
        ) if *peer == from && role == Role::Offerer => (
            state.clone(),
            vec![Action::ApplyAnswer {
                sdp: answer.description,
            }],
        ),

        (
            S::Offering { peer } | S::Answering { peer } | S::IceExchanging { peer },
            Event::Received {
                from,
                signal: Signal::Candidate(candidate),
            },
        ) if *peer == from => (state.clone(), vec![Action::AddCandidate(candidate)]),

        _ => unchanged(),
    }
}

fn described(
    peer: &PeerId,
    description: Signal,
    gathered: &[Candidate],
    policy: &CandidatePolicy,
) -> (NegotiationState, Vec<Action>) {
    (
        NegotiationState::IceExchanging { peer: peer.clone() },
        vec![
            Action::Send {
                to: peer.clone(),
                signal: description,
            },
            Action::SendCandidates {
                to: peer.clone(),
                candidates: policy.select(gathered),
            },
        ],
    )
}

/// State machine of one negotiation.
#[derive(Debug)]
pub struct Session {
    state: NegotiationState,
    role: Role,
    policy: CandidatePolicy,
}

impl Session {
    pub fn new(role: Role, policy: CandidatePolicy) -> Self {
        Self {
            state: NegotiationState::Idle,
            role,
            policy,
        }
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn policy(&self) -> &CandidatePolicy {
        &self.policy
    }

    pub fn step(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = transition(&self.state, self.role, &self.policy, event);
        self.state = next;
        actions
    }
}
