//! Request payload generation.
//!
//! The engine itself is agnostic to how a payload is produced for a given
//! request id; it only needs a `PayloadGenerator`. `ConstantPayloadGenerator`
//! covers the `-f` file-backed CLI mode. Callers embedding `blast` as a
//! library may supply their own generator for dynamic payloads.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Produces the bytes to send for a given request id.
pub trait PayloadGenerator: Send + Sync {
    /// Returns the payload for `request_id`. May be called concurrently from
    /// multiple worker threads and must not block meaningfully.
    fn generate(&self, request_id: u64) -> Arc<Vec<u8>>;
}

/// Returns the same payload bytes for every request.
pub struct ConstantPayloadGenerator {
    payload: Arc<Vec<u8>>,
}

impl ConstantPayloadGenerator {
    pub fn new(payload: Vec<u8>) -> ConstantPayloadGenerator {
        ConstantPayloadGenerator {
            payload: Arc::new(payload),
        }
    }
}

impl PayloadGenerator for ConstantPayloadGenerator {
    fn generate(&self, _request_id: u64) -> Arc<Vec<u8>> {
        self.payload.clone()
    }
}

/// Reads a payload file into memory once at startup, for the `-f` CLI mode.
pub struct FilePayloadProvider {
    content: Vec<u8>,
}

impl FilePayloadProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<FilePayloadProvider> {
        let content = fs::read(path)?;
        Ok(FilePayloadProvider { content })
    }

    /// Consumes the provider, returning the file content.
    pub fn get(self) -> Vec<u8> {
        self.content
    }
}
