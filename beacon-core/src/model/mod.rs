mod peer;
mod request;
mod room;
mod signaling;

pub use peer::PeerId;
pub use request::{ControlRequest, ErrorBody, PollRequest, PollResponse};
pub use room::{Room, RoomId};
pub use signaling::{Candidate, Description, Envelope, Signal, SignalKind};
