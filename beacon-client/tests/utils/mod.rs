
pub use mock_peer::*;
pub use test_relay::*;
