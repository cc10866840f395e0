use anyhow::Result;
use tracing::debug;

use integrity_core::config::{validate_config, IntegrityConfig};
use integrity_core::signer::TokenSigner;
use integrity_core::verifier::TokenVerifier;

use crate::args::{Cli, Command};
use crate::io::input;

mod manifest;
mod sign;
mod verify;
mod verify_manifest;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sign { input, out, key, issuer } => sign::run(&input, &out, &key, &issuer),
        Command::Manifest { paths, out, key, issuer, recursive } => {
            manifest::run(&paths, &out, &key, &issuer, recursive)
        }
        Command::Verify { input, token, key, issuer } => verify::run(&input, &token, &key, &issuer),
        Command::VerifyManifest { token, root, key, issuer } => {
            verify_manifest::run(&token, &root, &key, &issuer)
        }
    }
}

/// Shared `--json` body for a failed verification.
#[derive(Debug, serde::Serialize)]
pub(crate) struct FailureOut<'a> {
    pub ok: bool,
    pub kind: &'a str,
    pub error: String,
}

/// A failure that has already been written to stdout.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Reported {
    pub kind: &'static str,
    pub message: String,
}

pub(crate) fn report_failure(e: integrity_core::IntegrityError) -> anyhow::Error {
    let kind = e.kind().as_str();
    let body = FailureOut {
        ok: false,
        kind,
        error: e.to_string(),
    };
    if let Err(print_err) = crate::output::print(&body, false, &body.error) {
        return print_err.context(e);
    }
    debug!(kind, error = %body.error, "verification failure reported");
    anyhow::Error::new(Reported {
        kind,
        message: body.error,
    })
}

fn config() -> Result<IntegrityConfig> {
    let cfg = IntegrityConfig::default();
    validate_config(&cfg)?;
    Ok(cfg)
}

pub(crate) fn signer(key_path: &str) -> Result<TokenSigner> {
    let cfg = config()?;
    Ok(TokenSigner::with_config(input::signing_key(key_path)?, &cfg.signing))
}

pub(crate) fn verifier(key_path: &str) -> Result<TokenVerifier> {
    let cfg = config()?;
    Ok(TokenVerifier::with_config(input::verifying_key(key_path)?, &cfg.verification))
}

pub(crate) fn rfc3339(unix: i64) -> Result<String> {
    use time::format_description::well_known::Rfc3339;
    let ts = time::OffsetDateTime::from_unix_timestamp(unix)?;
    Ok(ts.format(&Rfc3339)?)
}
