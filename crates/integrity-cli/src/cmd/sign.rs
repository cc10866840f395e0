use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::io::export;
use crate::output;

#[derive(Debug, Serialize)]
pub struct SignOut {
    pub ok: bool,
    pub input: String,
    pub out: String,
    pub issuer: String,
    pub algorithm: String,
    pub elapsed_ms: u128,
}

pub fn run(input_path: &str, out: &str, key_path: &str, issuer: &str) -> Result<()> {
    let started = Instant::now();
    let signer = super::signer(key_path)?;

    let token = signer.sign_file(issuer, input_path)?;
    export::write_token(out, &token)?;
    info!(input = input_path, out, "token written");

    let body = SignOut {
        ok: true,
        input: input_path.to_string(),
        out: out.to_string(),
        issuer: issuer.to_string(),
        algorithm: signer.algorithm().to_string(),
        elapsed_ms: started.elapsed().as_millis(),
    };
    output::print(&body, true, &format!("signed {input_path} -> {out}"))
}
