use crate::transport::TransportConfig;
use beacon_core::Candidate;
use std::time::Duration;

/// Which side of the offer/answer exchange a session is willing to take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    /// Waits for an offer and answers it.
    #[default]
    Answerer,
    /// Answers offers too, but also offers to any peer announcing itself
    /// with a request while this session is still waiting.
    Offerer,
}

/// How locally gathered candidates are trickled to the remote peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidatePolicy {
    /// Number of leading candidates that are never sent.
    pub skip_leading: usize,
    /// Delay between two candidate sends.
    pub pacing: Duration,
}

impl CandidatePolicy {
    /// Matches clients of the older relay, which dropped the first two
    /// candidates.
    pub fn legacy() -> Self {
        Self {
            skip_leading: 2,
            ..Self::default()
        }
    }

    pub fn select(&self, candidates: &[Candidate]) -> Vec<Candidate> {
        candidates.iter().skip(self.skip_leading).cloned().collect()
    }
}

impl Default for CandidatePolicy {
    fn default() -> Self {
        Self {
            skip_leading: 0,
            pacing: Duration::from_millis(10),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NegotiatorConfig {
    pub role: Role,
    pub candidates: CandidatePolicy,
    pub transport: TransportConfig,
}
