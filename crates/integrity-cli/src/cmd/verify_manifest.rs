use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use tracing::info;

use crate::output;

#[derive(Debug, Serialize)]
pub struct VerifyManifestOut {
    pub ok: bool,
    pub token: String,
    pub issuer: String,
    pub issued_at: String,
    pub files: BTreeMap<String, String>,
}

pub fn run(token_path: &str, root: &str, key_path: &str, issuer: &str) -> Result<()> {
    let verifier = super::verifier(key_path)?;

    let claims = verifier
        .verify_manifest(issuer, token_path, root)
        .map_err(super::report_failure)?;

    let files: BTreeMap<String, String> = claims
        .payload
        .digests()
        .into_iter()
        .map(|(path, d)| (path.to_string(), d.to_hex()))
        .collect();
    info!(token = token_path, files = files.len(), "manifest verified");
    let summary = format!("{} files match {token_path}", files.len());
    let body = VerifyManifestOut {
        ok: true,
        token: token_path.to_string(),
        issuer: claims.issuer.clone(),
        issued_at: super::rfc3339(claims.issued_at)?,
        files,
    };
    output::print(&body, true, &summary)
}
