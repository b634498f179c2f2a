//! Port traits decoupling the domain from concrete infrastructure.

pub mod blob_port;
pub mod config_port;
pub mod store_port;
