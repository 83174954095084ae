pub mod config;
pub mod error;
pub mod room;
pub mod signaling;
pub mod store;

pub use config::{RetentionConfig, ServerConfig};
pub use error::{ApiError, RoomError, StoreError};
pub use room::*;
pub use signaling::*;
pub use store::*;
