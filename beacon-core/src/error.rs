use thiserror::Error;

/// Failures decoding an envelope relayed through a room.
///
/// These never affect the poll loop: the offending envelope is logged and
/// discarded by whoever dispatched it.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown envelope type: {0}")]
    UnknownType(String),
}
