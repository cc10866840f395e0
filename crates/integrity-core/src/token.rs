//! Compact token codec.
//!
//! A token is three base64url (unpadded) segments joined by `.`:
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(signature)
//! ```
//!
//! The header declares the algorithm (`{"alg":"RS512","typ":"JWT"}`); the
//! signature covers the ASCII bytes of `header.claims` exactly as they appear
//! in the token. Only the RSASSA-PKCS1-v1_5 family is recognized. Any other
//! `alg` (including `none` and the HMAC family) is refused before any
//! cryptographic work, so a token cannot steer verification onto a symmetric
//! scheme keyed with the public key.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha384, Sha512};

use crate::claims::RawClaims;
use crate::errors::{IntegrityError, IntegrityResult};

/// Signature algorithm identifier carried in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Rs256,
    Rs384,
    Rs512,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
        }
    }

    /// Parse a header `alg` value. Anything outside the RSA PKCS#1 v1.5 family
    /// is a signature error.
    pub fn parse(s: &str) -> IntegrityResult<Self> {
        match s {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            _ => Err(IntegrityError::signature(format!(
                "unexpected signing algorithm {s:?}, expected an RSA algorithm"
            ))),
        }
    }

    /// Padding scheme plus the message hash it signs over.
    fn prehash(&self, message: &[u8]) -> (Pkcs1v15Sign, Vec<u8>) {
        match self {
            Self::Rs256 => (Pkcs1v15Sign::new::<Sha256>(), Sha256::digest(message).to_vec()),
            Self::Rs384 => (Pkcs1v15Sign::new::<Sha384>(), Sha384::digest(message).to_vec()),
            Self::Rs512 => (Pkcs1v15Sign::new::<Sha512>(), Sha512::digest(message).to_vec()),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A token split into its parts. Nothing has been verified yet.
#[derive(Debug)]
pub(crate) struct DecodedToken<'a> {
    pub header: Header,
    pub claims: RawClaims,
    signing_input: &'a str,
    signature: Vec<u8>,
}

impl DecodedToken<'_> {
    /// Check the declared algorithm and the signature against `key`.
    pub fn verify_signature(&self, key: &RsaPublicKey) -> IntegrityResult<SigningAlgorithm> {
        let alg = SigningAlgorithm::parse(&self.header.alg)?;
        let (scheme, hashed) = alg.prehash(self.signing_input.as_bytes());
        key.verify(scheme, &hashed, &self.signature)
            .map_err(|e| IntegrityError::signature(format!("{alg} verification failed: {e}")))?;
        Ok(alg)
    }
}

/// Serialize `claims`, sign them with `key` and return the compact token.
pub(crate) fn encode(
    alg: SigningAlgorithm,
    claims: &RawClaims,
    key: &RsaPrivateKey,
) -> IntegrityResult<String> {
    let header = Header {
        alg: alg.as_str().to_string(),
        typ: Some(crate::defaults::TOKEN_TYPE.to_string()),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| IntegrityError::parse(format!("failed to serialize header: {e}")))?;
    let claims_json = serde_json::to_vec(claims)
        .map_err(|e| IntegrityError::parse(format!("failed to serialize claims: {e}")))?;

    let mut token = URL_SAFE_NO_PAD.encode(header_json);
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(claims_json));

    let (scheme, hashed) = alg.prehash(token.as_bytes());
    let signature = key
        .sign(scheme, &hashed)
        .map_err(|e| IntegrityError::key(format!("{alg} signing failed: {e}")))?;

    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(signature));
    Ok(token)
}

/// Split and decode a compact token without verifying it.
pub(crate) fn decode(token: &str) -> IntegrityResult<DecodedToken<'_>> {
    let mut parts = token.split('.');
    let (Some(h), Some(c), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(IntegrityError::parse(
            "token contains an invalid number of segments",
        ));
    };

    let header: Header = serde_json::from_slice(&decode_segment(h, "header")?)
        .map_err(|e| IntegrityError::parse(format!("invalid header json: {e}")))?;
    let claims: RawClaims = serde_json::from_slice(&decode_segment(c, "claims")?)
        .map_err(|e| IntegrityError::parse(format!("invalid claims json: {e}")))?;
    let signature = decode_segment(s, "signature")?;

    Ok(DecodedToken {
        header,
        claims,
        signing_input: &token[..h.len() + 1 + c.len()],
        signature,
    })
}

fn decode_segment(seg: &str, what: &str) -> IntegrityResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(seg)
        .map_err(|e| IntegrityError::parse(format!("invalid base64 in {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use assert_matches::assert_matches;

    #[test]
    fn parse_rsa_family() {
        assert_eq!(SigningAlgorithm::parse("RS512").unwrap(), SigningAlgorithm::Rs512);
        assert_eq!(SigningAlgorithm::parse("RS256").unwrap(), SigningAlgorithm::Rs256);
    }

    #[test]
    fn parse_rejects_other_families() {
        for alg in ["HS256", "HS512", "none", "ES256", "PS512", "EdDSA", ""] {
            let e = SigningAlgorithm::parse(alg).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::Signature, "alg {alg}");
        }
    }

    #[test]
    fn wrong_segment_count() {
        assert_matches!(decode("this is not a JWT"), Err(IntegrityError::Parse(_)));
        assert_matches!(decode("a.b"), Err(IntegrityError::Parse(_)));
        assert_matches!(decode("a.b.c.d"), Err(IntegrityError::Parse(_)));
    }

    #[test]
    fn bad_base64() {
        assert_matches!(decode("!!.!!.!!"), Err(IntegrityError::Parse(_)));
    }

    #[test]
    fn decodes_header_and_claims() {
        let h = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS512","typ":"JWT"}"#);
        let c = URL_SAFE_NO_PAD.encode(br#"{"iss":"me","iat":1}"#);
        let token = format!("{h}.{c}.");
        let d = decode(&token).unwrap();
        assert_eq!(d.header.alg, "RS512");
        assert_eq!(d.claims.iss.as_deref(), Some("me"));
        assert_eq!(d.signing_input, format!("{h}.{c}"));
        assert!(d.signature.is_empty());
    }

    #[test]
    fn header_serialization() {
        let h = Header {
            alg: "RS512".to_string(),
            typ: Some("JWT".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&h).unwrap(),
            r#"{"alg":"RS512","typ":"JWT"}"#
        );
    }
}
