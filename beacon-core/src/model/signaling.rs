use crate::error::ProtocolError;
use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// SDP carried by an offer or an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(alias = "Description")]
    pub description: String,
}

impl Description {
    pub fn new(sdp: impl Into<String>) -> Self {
        Self {
            description: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate: String,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_m_line_index: u16,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: String,
}

/// Negotiation payload carried by an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Request,
    Offer(Description),
    Answer(Description),
    Candidate(Candidate),
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Request => SignalKind::Request,
            Signal::Offer(_) => SignalKind::Offer,
            Signal::Answer(_) => SignalKind::Answer,
            Signal::Candidate(_) => SignalKind::Candidate,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Signal::Request => json!({}),
            Signal::Offer(d) | Signal::Answer(d) => json!({ "description": d.description }),
            Signal::Candidate(c) => json!({
                "candidate": c.candidate,
                "sdpMLineIndex": c.sdp_m_line_index,
                "sdpMid": c.sdp_mid,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Request,
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Request => "request",
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }

    pub fn parse(tag: &str) -> Result<Self, ProtocolError> {
        match tag {
            "request" => Ok(SignalKind::Request),
            "offer" => Ok(SignalKind::Offer),
            "answer" => Ok(SignalKind::Answer),
            "candidate" => Ok(SignalKind::Candidate),
            other => Err(ProtocolError::UnknownType(other.to_owned())),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressed wrapper relayed through a room's log.
///
/// Wire shape: `{"type": .., "sender": .., "to": .., "value": ..}` where an
/// empty `to` is a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: PeerId,
    #[serde(default)]
    pub to: PeerId,
    #[serde(default)]
    pub value: Value,
}

impl Envelope {
    pub fn new(sender: PeerId, to: PeerId, signal: &Signal) -> Self {
        Self {
            kind: signal.kind().as_str().to_owned(),
            sender,
            to,
            value: signal.to_value(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decodes the payload according to the type tag.
    pub fn signal(&self) -> Result<Signal, ProtocolError> {
        let signal = match SignalKind::parse(&self.kind)? {
            SignalKind::Request => Signal::Request,
            SignalKind::Offer => Signal::Offer(serde_json::from_value(self.value.clone())?),
            SignalKind::Answer => Signal::Answer(serde_json::from_value(self.value.clone())?),
            SignalKind::Candidate => {
                Signal::Candidate(serde_json::from_value(self.value.clone())?)
            }
        };
        Ok(signal)
    }

    /// An envelope is ours unless we sent it or it is addressed to someone else.
    pub fn accepted_by(&self, me: &PeerId) -> bool {
        self.sender != *me && (self.to.is_broadcast() || self.to == *me)
    }
}
