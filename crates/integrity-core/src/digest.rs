//! File digests.
//!
//! A digest is the SHA-256 of a file's full content. Externally it is always
//! lowercase hex, 64 characters, no prefix.

use std::fmt;
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::errors::{IntegrityError, IntegrityResult};

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode a hex digest. Anything that is not exactly 32 bytes once decoded
    /// is rejected as a claim error.
    pub fn from_hex(s: &str) -> IntegrityResult<Self> {
        let raw = hex::decode(s)
            .map_err(|e| IntegrityError::claim(format!("invalid hex digest {s:?}: {e}")))?;
        let bytes: [u8; DIGEST_LEN] = raw.as_slice().try_into().map_err(|_| {
            IntegrityError::claim(format!(
                "digest must decode to {DIGEST_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Digest an in-memory byte sequence.
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    let mut h = Sha256::new();
    h.update(bytes);
    Digest(h.finalize().into())
}

/// Read a whole file into memory. Failures carry the offending path.
pub fn read_file<P: AsRef<Path>>(path: P) -> IntegrityResult<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| IntegrityError::io(path, e))
}

/// Digest the full content of the file at `path`.
pub fn digest_file<P: AsRef<Path>>(path: P) -> IntegrityResult<Digest> {
    let path = path.as_ref();
    let bytes = read_file(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "digested file");
    Ok(digest_bytes(&bytes))
}
