mod peer_connection;
mod peer_stream;
mod rtc_config;
mod rtc_peer;

pub use peer_connection::*;
pub use peer_stream::*;
pub use rtc_config::*;
pub use rtc_peer::*;
