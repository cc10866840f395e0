//! Token signing.
//!
//! `TokenSigner` turns file content into a signed token:
//!
//! ```text
//! paths/data -> digest (per file) -> ClaimSet -> encode + sign -> token bytes
//! ```
//!
//! The signer never writes files; persisting the returned bytes is the
//! caller's job.

use std::collections::BTreeMap;

use rsa::RsaPrivateKey;
use tracing::{debug, info};

use crate::claims::ClaimSet;
use crate::clock::{Clock, SharedClock};
use crate::config::SigningConfig;
use crate::digest::{digest_bytes, digest_file, read_file};
use crate::errors::{IntegrityError, IntegrityResult};
use crate::paths::dedup_paths;
use crate::token::{self, SigningAlgorithm};

#[derive(Debug, Clone)]
pub struct TokenSigner {
    key: RsaPrivateKey,
    algorithm: SigningAlgorithm,
    clock: SharedClock,
}

impl TokenSigner {
    /// RS512 signer on the system clock.
    pub fn new(key: RsaPrivateKey) -> Self {
        Self::with_config(key, &SigningConfig::default())
    }

    pub fn with_config(key: RsaPrivateKey, cfg: &SigningConfig) -> Self {
        Self {
            key,
            algorithm: cfg.algorithm,
            clock: SharedClock::default(),
        }
    }

    /// Replace the time source used for `iat`/`nbf`.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = SharedClock::new(clock);
        self
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Sign the digest of `data` under `subject`.
    pub fn sign(&self, issuer: &str, subject: &str, data: &[u8]) -> IntegrityResult<Vec<u8>> {
        if issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        if subject.is_empty() {
            return Err(IntegrityError::validation("subject cannot be blank"));
        }
        if data.is_empty() {
            return Err(IntegrityError::validation("data cannot be empty"));
        }

        let digest = digest_bytes(data);
        let claims = ClaimSet::single(issuer, subject, digest, self.clock.now_unix())?;
        let token = self.sign_claims(&claims)?;
        info!(issuer, subject, %digest, "signed file digest");
        Ok(token)
    }

    /// Read the file at `path` and sign it with the path as subject.
    pub fn sign_file(&self, issuer: &str, path: &str) -> IntegrityResult<Vec<u8>> {
        if issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        if path.is_empty() {
            return Err(IntegrityError::validation("path cannot be blank"));
        }
        let data = read_file(path)?;
        self.sign(issuer, path, &data)
    }

    /// Sign a manifest of digests for `paths`.
    ///
    /// Duplicate paths are dropped before digesting. Keys are the paths as
    /// given. Any unreadable file fails the whole call.
    pub fn sign_manifest<S: AsRef<str>>(&self, issuer: &str, paths: &[S]) -> IntegrityResult<Vec<u8>> {
        if issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        if paths.is_empty() {
            return Err(IntegrityError::validation("must specify at least one path"));
        }

        let paths = dedup_paths(paths);
        let mut entries = BTreeMap::new();
        for p in paths {
            if p.is_empty() {
                return Err(IntegrityError::validation("path cannot be blank"));
            }
            let digest = digest_file(&p)?;
            entries.insert(p, digest);
        }

        let count = entries.len();
        let claims = ClaimSet::manifest(issuer, entries, self.clock.now_unix())?;
        let token = self.sign_claims(&claims)?;
        info!(issuer, files = count, "signed manifest");
        Ok(token)
    }

    /// Encode and sign an already-built claim set. The set is validated
    /// first, so a hand-assembled `ClaimSet` gets the same checks as one from
    /// `ClaimSet::single` or `ClaimSet::manifest`.
    pub fn sign_claims(&self, claims: &ClaimSet) -> IntegrityResult<Vec<u8>> {
        claims.validate()?;
        debug!(
            alg = %self.algorithm,
            payload = claims.payload.kind(),
            iat = claims.issued_at,
            "signing claims"
        );
        let token = token::encode(self.algorithm, &claims.to_raw(), &self.key)?;
        Ok(token.into_bytes())
    }
}
