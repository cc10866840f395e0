//! Signed statements.
//!
//! A `ClaimSet` pairs the registered fields (issuer, issued-at, optional
//! not-before/expiry) with one of two payloads:
//! - `Single`: one `(subject, digest)` pair
//! - `Manifest`: a `path -> digest` mapping
//!
//! On the wire the claims are a flat JSON object:
//! - single file: `{"iss","sub","nbf","iat","digest"}`
//! - manifest:    `{"iss","iat","manifest":{path: hex}}`
//!
//! Field order follows the registered-claims order (`iss, sub, exp, nbf, iat`)
//! followed by the payload fields, and manifest keys are sorted, so a claim set
//! always serializes to the same bytes.

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::digest::Digest;
use crate::errors::{IntegrityError, IntegrityResult};

/// Payload variant of a claim set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimPayload {
    Single { subject: String, digest: Digest },
    Manifest(BTreeMap<String, Digest>),
}

impl ClaimPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Manifest(_) => "manifest",
        }
    }

    /// Every covered name with its digest: the subject of a single-file
    /// payload, or each manifest path.
    pub fn digests(&self) -> BTreeMap<&str, Digest> {
        match self {
            Self::Single { subject, digest } => BTreeMap::from([(subject.as_str(), *digest)]),
            Self::Manifest(entries) => entries.iter().map(|(p, d)| (p.as_str(), *d)).collect(),
        }
    }
}

/// A statement about file digests, signed by `issuer` at `issued_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub issuer: String,
    /// Seconds since the Unix epoch.
    pub issued_at: i64,
    pub not_before: Option<i64>,
    pub expires_at: Option<i64>,
    pub payload: ClaimPayload,
}

impl ClaimSet {
    /// Build single-file claims. `nbf` is pinned to `iat`.
    pub fn single(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        digest: Digest,
        issued_at: i64,
    ) -> IntegrityResult<Self> {
        let issuer = require_non_empty(issuer.into(), "issuer")?;
        let subject = require_non_empty(subject.into(), "subject")?;
        Ok(Self {
            issuer,
            issued_at,
            not_before: Some(issued_at),
            expires_at: None,
            payload: ClaimPayload::Single { subject, digest },
        })
    }

    /// Build manifest claims. The mapping must hold at least one path.
    pub fn manifest(
        issuer: impl Into<String>,
        entries: BTreeMap<String, Digest>,
        issued_at: i64,
    ) -> IntegrityResult<Self> {
        let issuer = require_non_empty(issuer.into(), "issuer")?;
        if entries.is_empty() {
            return Err(IntegrityError::validation(
                "manifest must contain at least one path",
            ));
        }
        Ok(Self {
            issuer,
            issued_at,
            not_before: None,
            expires_at: None,
            payload: ClaimPayload::Manifest(entries),
        })
    }

    /// Re-check the constructor invariants on a claim set that may have been
    /// assembled field by field.
    pub fn validate(&self) -> IntegrityResult<()> {
        if self.issuer.is_empty() {
            return Err(IntegrityError::validation("issuer cannot be blank"));
        }
        match &self.payload {
            ClaimPayload::Single { subject, .. } if subject.is_empty() => {
                Err(IntegrityError::validation("subject cannot be blank"))
            }
            ClaimPayload::Manifest(entries) if entries.is_empty() => Err(
                IntegrityError::validation("manifest must contain at least one path"),
            ),
            ClaimPayload::Manifest(entries) if entries.contains_key("") => {
                Err(IntegrityError::validation("path cannot be blank"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn to_raw(&self) -> RawClaims {
        let mut raw = RawClaims {
            iss: Some(self.issuer.clone()),
            exp: self.expires_at,
            nbf: self.not_before,
            iat: Some(self.issued_at),
            ..RawClaims::default()
        };
        match &self.payload {
            ClaimPayload::Single { subject, digest } => {
                raw.sub = Some(subject.clone());
                raw.digest = Some(digest.to_hex());
            }
            ClaimPayload::Manifest(entries) => {
                raw.manifest = Some(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_hex()))
                        .collect(),
                );
            }
        }
        raw
    }
}

fn require_non_empty(s: String, field: &str) -> IntegrityResult<String> {
    if s.is_empty() {
        return Err(IntegrityError::validation(format!("{field} cannot be blank")));
    }
    Ok(s)
}

/// Claims exactly as they appear in a token payload, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_date"
    )]
    pub exp: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_date"
    )]
    pub nbf: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "numeric_date"
    )]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<BTreeMap<String, String>>,
}

impl RawClaims {
    /// Convert checked raw claims into a typed claim set.
    ///
    /// Registered claims must already have been validated; this step only
    /// settles the payload shape and decodes digests.
    pub fn into_claim_set(self) -> IntegrityResult<ClaimSet> {
        let issuer = self
            .iss
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IntegrityError::claim("token has no issuer"))?;
        let issued_at = self
            .iat
            .ok_or_else(|| IntegrityError::claim("token has no issued-at claim"))?;

        let payload = match (self.sub, self.digest, self.manifest) {
            (Some(subject), Some(digest), None) => {
                let digest = Digest::from_hex(&digest)
                    .map_err(|e| IntegrityError::claim(format!("subject {subject}: {e}")))?;
                ClaimPayload::Single { subject, digest }
            }
            (None, None, Some(entries)) => {
                if entries.is_empty() {
                    return Err(IntegrityError::claim("manifest is empty"));
                }
                let mut out = BTreeMap::new();
                for (path, hex_digest) in entries {
                    let digest = Digest::from_hex(&hex_digest)
                        .map_err(|e| IntegrityError::claim(format!("manifest entry {path}: {e}")))?;
                    out.insert(path, digest);
                }
                ClaimPayload::Manifest(out)
            }
            (_, _, Some(_)) => {
                return Err(IntegrityError::claim(
                    "token carries both single-file and manifest claims",
                ))
            }
            _ => {
                return Err(IntegrityError::claim(
                    "token carries neither a subject digest nor a manifest",
                ))
            }
        };

        Ok(ClaimSet {
            issuer,
            issued_at,
            not_before: self.nbf,
            expires_at: self.exp,
            payload,
        })
    }
}

/// NumericDate: integer seconds, with fractional values truncated.
fn numeric_date<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let n: Option<serde_json::Number> = Option::deserialize(d)?;
    n.map(|n| {
        n.as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| de::Error::custom(format!("invalid numeric date: {n}")))
    })
    .transpose()
}
