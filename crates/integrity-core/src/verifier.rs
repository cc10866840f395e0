//! Token verification.
//!
//! Every entry point runs the same stages, stopping at the first failure:
//!
//! ```text
//! parse -> signature -> issuer -> time window -> digest recompute + compare
//! ```
//!
//! The first four stages are shared by single-file and manifest tokens; only
//! the digest stage depends on the payload variant. Success returns the
//! verified claim set. There is no partial result.

use std::fmt;
use std::path::Path;

use rsa::RsaPublicKey;
use time::Duration;
use tracing::{debug, info, warn};

use crate::claims::{ClaimPayload, ClaimSet, RawClaims};
use crate::clock::{Clock, SharedClock};
use crate::config::VerificationConfig;
use crate::digest::{digest_bytes, digest_file, read_file};
use crate::errors::{IntegrityError, IntegrityResult};
use crate::token;

/// Verification stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStage {
    Parse,
    Signature,
    Issuer,
    TimeWindow,
    Digest,
}

impl VerifyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Signature => "signature",
            Self::Issuer => "issuer",
            Self::TimeWindow => "time-window",
            Self::Digest => "digest",
        }
    }
}

impl fmt::Display for VerifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: RsaPublicKey,
    leeway: Duration,
    clock: SharedClock,
}

impl TokenVerifier {
    /// Verifier with the default 10 s leeway on the system clock.
    pub fn new(key: RsaPublicKey) -> Self {
        Self::with_config(key, &VerificationConfig::default())
    }

    pub fn with_config(key: RsaPublicKey, cfg: &VerificationConfig) -> Self {
        Self {
            key,
            leeway: cfg.leeway,
            clock: SharedClock::default(),
        }
    }

    /// Replace the time source used for the time-window checks.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = SharedClock::new(clock);
        self
    }

    /// Verify a single-file token against in-memory `data`.
    pub fn verify(
        &self,
        issuer: &str,
        subject: &str,
        data: &[u8],
        token: &[u8],
    ) -> IntegrityResult<ClaimSet> {
        logged(subject, self.verify_single(issuer, subject, data, token))
    }

    /// Verify the file at `path` against the token stored at `integrity_path`.
    pub fn verify_file(
        &self,
        issuer: &str,
        path: &str,
        integrity_path: &str,
    ) -> IntegrityResult<ClaimSet> {
        let run = || -> IntegrityResult<ClaimSet> {
            if issuer.is_empty() {
                return Err(IntegrityError::validation("issuer cannot be blank"));
            }
            if path.is_empty() {
                return Err(IntegrityError::validation("path cannot be blank"));
            }
            if integrity_path.is_empty() {
                return Err(IntegrityError::validation("integrity path cannot be blank"));
            }
            let token = read_file(integrity_path)?;
            let data = read_file(path)?;
            self.verify_single(issuer, path, &data, &token)
        };
        logged(path, run())
    }

    /// Verify a manifest token stored at `root/manifest_path`.
    ///
    /// Manifest entries are resolved against the current working directory,
    /// not against `root`. All entries must match.
    pub fn verify_manifest<P: AsRef<Path>>(
        &self,
        issuer: &str,
        manifest_path: &str,
        root: P,
    ) -> IntegrityResult<ClaimSet> {
        let run = || -> IntegrityResult<ClaimSet> {
            if issuer.is_empty() {
                return Err(IntegrityError::validation("issuer cannot be blank"));
            }
            if manifest_path.is_empty() {
                return Err(IntegrityError::validation("manifest path cannot be blank"));
            }
            let token = read_file(root.as_ref().join(manifest_path))?;
            self.verify_manifest_token(issuer, &token)
        };
        logged(manifest_path, run())
    }

    /// Verify an in-memory manifest token.
    pub fn verify_manifest_token(&self, issuer: &str, token: &[u8]) -> IntegrityResult<ClaimSet> {
        let claims = self.verify_claims(issuer, token)?;
        let ClaimPayload::Manifest(entries) = &claims.payload else {
            return Err(IntegrityError::claim("expected a manifest token"));
        };

        debug!(stage = %VerifyStage::Digest, files = entries.len(), "recomputing digests");
        for (path, claimed) in entries {
            let actual = digest_file(path)?;
            if actual != *claimed {
                return Err(IntegrityError::digest_mismatch(path.as_str()));
            }
        }

        info!(issuer, files = entries.len(), "manifest verified");
        Ok(claims)
    }

    /// Run the parse, signature, issuer and time-window stages and return the
    /// typed claims. Digests are not recomputed.
    pub fn verify_claims(&self, issuer: &str, token: &[u8]) -> IntegrityResult<ClaimSet> {
        if issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        if token.is_empty() {
            return Err(IntegrityError::validation("token cannot be empty"));
        }

        debug!(stage = %VerifyStage::Parse, "parsing token");
        let token = std::str::from_utf8(token)
            .map_err(|_| IntegrityError::parse("token is not valid utf-8"))?;
        let decoded = token::decode(token)?;

        debug!(stage = %VerifyStage::Signature, alg = %decoded.header.alg, "checking signature");
        decoded.verify_signature(&self.key)?;

        debug!(stage = %VerifyStage::Issuer, "checking issuer");
        check_issuer(&decoded.claims, issuer)?;

        debug!(stage = %VerifyStage::TimeWindow, "checking time window");
        self.check_time_window(&decoded.claims)?;

        decoded.claims.into_claim_set()
    }

    fn verify_single(
        &self,
        issuer: &str,
        subject: &str,
        data: &[u8],
        token: &[u8],
    ) -> IntegrityResult<ClaimSet> {
        if issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        if subject.is_empty() {
            return Err(IntegrityError::validation("subject cannot be blank"));
        }
        if data.is_empty() {
            return Err(IntegrityError::validation("data cannot be empty"));
        }
        if token.is_empty() {
            return Err(IntegrityError::validation("token cannot be empty"));
        }

        let claims = self.verify_claims(issuer, token)?;
        let ClaimPayload::Single { digest: claimed, .. } = &claims.payload else {
            return Err(IntegrityError::claim("expected a single-file token"));
        };

        debug!(stage = %VerifyStage::Digest, subject, "recomputing digest");
        if digest_bytes(data) != *claimed {
            return Err(IntegrityError::digest_mismatch(subject));
        }

        info!(issuer, subject, "file verified");
        Ok(claims)
    }

    fn check_time_window(&self, claims: &RawClaims) -> IntegrityResult<()> {
        let now = self.clock.now_unix();
        let leeway = self.leeway.whole_seconds();

        let iat = claims
            .iat
            .ok_or_else(|| IntegrityError::claim("token has no issued-at claim"))?;
        if iat > now.saturating_add(leeway) {
            return Err(IntegrityError::claim(format!(
                "token used before issued (iat {iat}, now {now})"
            )));
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(leeway) {
                return Err(IntegrityError::claim(format!(
                    "token is not valid yet (nbf {nbf}, now {now})"
                )));
            }
        }

        if let Some(exp) = claims.exp {
            if now.saturating_sub(leeway) >= exp {
                return Err(IntegrityError::claim(format!(
                    "token is expired (exp {exp}, now {now})"
                )));
            }
        }

        Ok(())
    }
}

fn check_issuer(claims: &RawClaims, expected: &str) -> IntegrityResult<()> {
    match claims.iss.as_deref() {
        Some(iss) if iss == expected => Ok(()),
        Some(iss) => Err(IntegrityError::claim(format!(
            "token has invalid issuer {iss:?}, expected {expected:?}"
        ))),
        None => Err(IntegrityError::claim("token has no issuer")),
    }
}

fn logged<T>(subject: &str, r: IntegrityResult<T>) -> IntegrityResult<T> {
    if let Err(e) = &r {
        warn!(subject, kind = e.kind().as_str(), error = %e, "verification failed");
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::SigningConfig;
    use crate::errors::ErrorKind;
    use crate::keys::{private_key_from_pem, public_key_from_pem};
    use crate::signer::TokenSigner;
    use crate::token::SigningAlgorithm;

    const PRIVATE_PEM: &str = include_str!("../tests/fixtures/test_rsa_private.pem");
    const PUBLIC_PEM: &str = include_str!("../tests/fixtures/test_rsa_public.pem");
    const NOW: i64 = 1_736_349_430;

    fn signer_at(t: i64) -> TokenSigner {
        TokenSigner::new(private_key_from_pem(PRIVATE_PEM).unwrap())
            .with_clock(FixedClock::from_unix(t).unwrap())
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(public_key_from_pem(PUBLIC_PEM).unwrap())
            .with_clock(FixedClock::from_unix(NOW).unwrap())
    }

    #[test]
    fn roundtrip_returns_claims() {
        let token = signer_at(NOW).sign("iss", "sub", b"content").unwrap();
        let claims = verifier().verify("iss", "sub", b"content", &token).unwrap();
        assert_eq!(claims.issuer, "iss");
        assert_eq!(claims.issued_at, NOW);
        assert_eq!(claims.not_before, Some(NOW));
    }

    #[test]
    fn rs256_and_rs384_tokens_verify() {
        for algorithm in [SigningAlgorithm::Rs256, SigningAlgorithm::Rs384] {
            let signer = TokenSigner::with_config(
                private_key_from_pem(PRIVATE_PEM).unwrap(),
                &SigningConfig { algorithm },
            )
            .with_clock(FixedClock::from_unix(NOW).unwrap());
            let token = signer.sign("iss", "sub", b"content").unwrap();

            let text = std::str::from_utf8(&token).unwrap();
            assert_eq!(token::decode(text).unwrap().header.alg, algorithm.as_str());

            verifier().verify("iss", "sub", b"content", &token).unwrap();
            let e = verifier().verify("iss", "sub", b"changed", &token).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::DigestMismatch);
        }
    }

    #[test]
    fn issuer_mismatch_is_claim_error() {
        let token = signer_at(NOW).sign("iss", "sub", b"content").unwrap();
        let e = verifier().verify("other", "sub", b"content", &token).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Claim);
    }

    #[test]
    fn leeway_boundary() {
        let ok = signer_at(NOW + 10).sign("iss", "sub", b"x").unwrap();
        verifier().verify("iss", "sub", b"x", &ok).unwrap();

        let late = signer_at(NOW + 11).sign("iss", "sub", b"x").unwrap();
        let e = verifier().verify("iss", "sub", b"x", &late).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Claim);
    }

    #[test]
    fn old_tokens_stay_valid() {
        let token = signer_at(NOW - 86_400 * 365).sign("iss", "sub", b"x").unwrap();
        verifier().verify("iss", "sub", b"x", &token).unwrap();
    }

    #[test]
    fn payload_variant_must_match_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("a.txt");
        std::fs::write(&f, b"a").unwrap();
        let manifest = signer_at(NOW)
            .sign_manifest("iss", &[f.to_str().unwrap()])
            .unwrap();
        let e = verifier().verify("iss", "sub", b"a", &manifest).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Claim);

        let single = signer_at(NOW).sign("iss", "sub", b"a").unwrap();
        let e = verifier().verify_manifest_token("iss", &single).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Claim);
    }

    #[test]
    fn missing_issued_at_rejected() {
        let raw = RawClaims {
            iss: Some("iss".to_string()),
            ..RawClaims::default()
        };
        let e = verifier().check_time_window(&raw).unwrap_err();
        assert!(e.to_string().contains("issued-at"));
    }

    #[test]
    fn not_before_and_expiry() {
        let v = verifier();
        let future_nbf = RawClaims {
            iat: Some(NOW),
            nbf: Some(NOW + 60),
            ..RawClaims::default()
        };
        assert!(v.check_time_window(&future_nbf).is_err());

        let expired = RawClaims {
            iat: Some(NOW - 120),
            exp: Some(NOW - 60),
            ..RawClaims::default()
        };
        assert!(v.check_time_window(&expired).is_err());

        let live = RawClaims {
            iat: Some(NOW),
            exp: Some(NOW + 60),
            ..RawClaims::default()
        };
        v.check_time_window(&live).unwrap();
    }

    #[test]
    fn stage_names() {
        assert_eq!(VerifyStage::TimeWindow.to_string(), "time-window");
    }
}
