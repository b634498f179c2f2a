//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod fs_blob_store;
pub mod sqlite_store;
pub mod web;
