mod key_value_store;
mod memory_store;

pub use key_value_store::*;
pub use memory_store::*;
