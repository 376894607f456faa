pub mod error;
pub mod identity;
pub mod memory;
pub mod store;
pub mod transport;
