use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::output;

#[derive(Debug, Serialize)]
pub struct VerifyOut {
    pub ok: bool,
    pub file: String,
    pub issuer: String,
    pub issued_at: String,
    pub files: BTreeMap<String, String>,
}

pub fn run(input_path: &str, token_path: &str, key_path: &str, issuer: &str) -> Result<()> {
    let verifier = super::verifier(key_path)?;

    let claims = verifier
        .verify_file(issuer, input_path, token_path)
        .map_err(super::report_failure)?;

    let files: BTreeMap<String, String> = claims
        .payload
        .digests()
        .into_iter()
        .map(|(name, d)| (name.to_string(), d.to_hex()))
        .collect();
    info!(file = input_path, issuer = %claims.issuer, "file verified");
    let body = VerifyOut {
        ok: true,
        file: input_path.to_string(),
        issuer: claims.issuer.clone(),
        issued_at: super::rfc3339(claims.issued_at)?,
        files,
    };
    output::print(&body, true, &format!("{input_path} matches {token_path}"))
}
