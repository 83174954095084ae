use std::net::SocketAddr;
use std::time::Duration;

/// How long room records and log entries survive in the store.
#[derive(Clone, Debug)]
pub struct RetentionConfig {
    /// Refreshed on every write of the room record.
    pub room_ttl: Duration,
    pub message_ttl: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            room_ttl: Duration::from_secs(5 * 60),
            message_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Prefix of every route, e.g. `/signal`. Empty serves from the root.
    pub base_path: String,
    pub retention: RetentionConfig,
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            base_path: String::new(),
            retention: RetentionConfig::default(),
            sweep_interval: Duration::from_secs(30),
        }
    }
}
