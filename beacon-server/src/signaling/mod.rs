mod http_handler;
mod signaling_service;

pub use http_handler::*;
pub use signaling_service::*;
