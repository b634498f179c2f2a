//! Blob storage port for uploaded chart images.

use crate::domain::error::JournalError;

/// Uploads larger than this are rejected with `PayloadTooLarge`.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub trait BlobPort {
    /// Validate and persist uploaded bytes, returning a stable reference
    /// string (a URL path) that the ledger stores verbatim on a trade.
    ///
    /// Fails with `UnsupportedMediaType` unless `declared_mime` begins
    /// with `image/`, and with `PayloadTooLarge` over [`MAX_UPLOAD_BYTES`].
    fn store(&self, bytes: &[u8], declared_mime: &str) -> Result<String, JournalError>;
}
