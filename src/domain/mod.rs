//! Core domain types and logic.

pub mod error;
pub mod password;
pub mod stats;
pub mod token;
pub mod trade;
pub mod user;

use rand::RngCore;

/// Generate an opaque 128-bit identifier as lowercase hex.
///
/// Used for server-assigned user and trade identifiers and for
/// collision-resistant upload names.
pub fn fresh_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
