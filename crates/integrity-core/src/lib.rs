//! integrity-core
//!
//! Core primitives for integrity tokens:
//! - SHA-256 file digests
//! - Claim sets for a single file or a manifest of files
//! - RS512 token signing with an injected clock
//! - Token verification (signature, issuer, time window, digest recompute)
//!
//! The crate performs only the file reads it needs to digest content and to
//! load a token from disk. It never writes files and never reads environment
//! variables.

pub mod claims;
pub mod clock;
pub mod config;
pub mod digest;
pub mod errors;
pub mod keys;
pub mod paths;
pub mod signer;
pub mod token;
pub mod verifier;

pub use crate::errors::{ErrorKind, IntegrityError, IntegrityResult};

/// Re-exported so callers can name key types without a direct `rsa` dependency.
pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Default settings.
pub mod defaults {
    /// Default file name for a persisted token.
    pub const TOKEN_FILE_NAME: &str = ".integrity";
    /// Tolerance for `iat`/`nbf`/`exp` comparisons, in seconds.
    pub const CLOCK_SKEW_SECS: i64 = 10;
    /// `typ` header value.
    pub const TOKEN_TYPE: &str = "JWT";
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::claims::{ClaimPayload, ClaimSet};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::{validate_config, IntegrityConfig, SigningConfig, VerificationConfig};
    pub use crate::digest::{digest_bytes, digest_file, Digest};
    pub use crate::keys::{load_private_key, load_public_key};
    pub use crate::paths::dedup_paths;
    pub use crate::signer::TokenSigner;
    pub use crate::token::SigningAlgorithm;
    pub use crate::verifier::{TokenVerifier, VerifyStage};
    pub use crate::{ErrorKind, IntegrityError, IntegrityResult, RsaPrivateKey, RsaPublicKey};
}
