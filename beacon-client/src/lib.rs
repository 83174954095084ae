//! Client side of the relay: the polling transport, the negotiation state
//! machine and the peer-connection capability it drives.

pub mod error;
pub mod negotiation;
pub mod peer;
pub mod transport;

pub use error::{NegotiationError, PeerError, TransportError};
pub use negotiation::*;
pub use peer::*;
pub use transport::*;
