use std::time::Duration;

/// Cadence and buffering of the polling loop.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Outbound payloads held before `send` starts waiting.
    pub queue_capacity: usize,
    /// Wait before the first round trip when nothing is enqueued.
    pub initial_delay: Duration,
    /// Wait between round trips when nothing is enqueued.
    pub poll_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            initial_delay: Duration::from_secs(1),
            poll_interval: Duration::from_millis(500),
        }
    }
}
