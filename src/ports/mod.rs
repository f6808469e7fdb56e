//! Port traits the domain depends on; adapters provide the implementations.

pub mod clock_port;
pub mod config_port;
pub mod data_port;
