/// Configuration of the webrtc-backed [`RtcPeer`](crate::RtcPeer).
#[derive(Clone, Debug)]
pub struct RtcConfig {
    pub ice_servers: Vec<String>,
    /// Label of the data channel opened by the offering side.
    pub channel_label: String,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
            channel_label: "data".to_owned(),
        }
    }
}
