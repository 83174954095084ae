mod relay_client;
mod signaling_transport;
mod transport_config;

pub use relay_client::*;
pub use signaling_transport::*;
pub use transport_config::*;
