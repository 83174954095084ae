mod negotiation_config;
mod negotiator;
mod state;

pub use negotiation_config::*;
pub use negotiator::*;
pub use state::*;
