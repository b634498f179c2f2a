//! Filesystem blob store for uploaded chart images.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::JournalError;
use crate::domain::fresh_id;
use crate::ports::blob_port::{BlobPort, MAX_UPLOAD_BYTES};
use crate::ports::config_port::ConfigPort;

pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let dir = config
            .get_string("uploads", "dir")
            .unwrap_or_else(|| "uploads".to_string());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Derive a filename extension from the MIME subtype, keeping only
/// alphanumerics so the declared type can never smuggle path characters.
fn extension_for(mime: &str) -> String {
    let subtype = mime.split('/').nth(1).unwrap_or_default();
    let ext: String = subtype
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if ext.is_empty() { "bin".to_string() } else { ext }
}

impl BlobPort for FsBlobStore {
    fn store(&self, bytes: &[u8], declared_mime: &str) -> Result<String, JournalError> {
        if !declared_mime.starts_with("image/") {
            return Err(JournalError::UnsupportedMediaType {
                mime: declared_mime.to_string(),
            });
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(JournalError::PayloadTooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let name = format!("{}.{}", fresh_id(), extension_for(declared_mime));
        fs::write(self.dir.join(&name), bytes)?;
        Ok(format!("/uploads/{name}"))
    }
}
