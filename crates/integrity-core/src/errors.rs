//! Error types for integrity-core.
//!
//! Every public operation returns `IntegrityResult<T>`. Each variant maps to one
//! failure kind so callers can tell a malformed argument from a tampered file
//! without parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Failure kind, independent of the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    Key,
    Parse,
    Signature,
    Claim,
    DigestMismatch,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Io => "io",
            Self::Key => "key",
            Self::Parse => "parse",
            Self::Signature => "signature",
            Self::Claim => "claim",
            Self::DigestMismatch => "digest-mismatch",
        }
    }
}

#[derive(Debug, Error)]
pub enum IntegrityError {
    /// A required argument is empty or missing.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key material could not be decoded or used.
    #[error("key error: {0}")]
    Key(String),

    /// The token is not well-formed.
    #[error("malformed token: {0}")]
    Parse(String),

    /// Algorithm mismatch or cryptographic verification failure.
    #[error("signature error: {0}")]
    Signature(String),

    /// Issuer mismatch, time-window violation or malformed claim values.
    #[error("claim error: {0}")]
    Claim(String),

    /// A recomputed digest differs from the signed one.
    #[error("digests do not match for {path}")]
    DigestMismatch { path: String },
}

impl IntegrityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    pub fn claim(msg: impl Into<String>) -> Self {
        Self::Claim(msg.into())
    }

    pub fn digest_mismatch(path: impl Into<String>) -> Self {
        Self::DigestMismatch { path: path.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
            Self::Key(_) => ErrorKind::Key,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Signature(_) => ErrorKind::Signature,
            Self::Claim(_) => ErrorKind::Claim,
            Self::DigestMismatch { .. } => ErrorKind::DigestMismatch,
        }
    }
}
