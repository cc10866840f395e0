use std::path::Path;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::io::{export, input};
use crate::output;

#[derive(Debug, Serialize)]
pub struct ManifestOut {
    pub ok: bool,
    pub out: String,
    pub issuer: String,
    pub files: Vec<String>,
}

pub fn run(args: &[String], out: &str, key_path: &str, issuer: &str, recursive: bool) -> Result<()> {
    let pb = if output::is_json() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    pb.set_message("collecting files");
    let paths = input::collect_paths(args, recursive, Path::new(out))?;
    if paths.is_empty() {
        pb.finish_and_clear();
        return Err(anyhow!("no files to sign"));
    }

    pb.set_message("loading key");
    let signer = super::signer(key_path)?;

    pb.set_message(format!("digesting {} files", paths.len()));
    let signed = signer.sign_manifest(issuer, &paths);
    pb.finish_and_clear();
    let token = signed?;

    export::write_token(out, &token)?;
    info!(out, "manifest token written");

    let files = integrity_core::paths::dedup_paths(&paths);
    let summary = format!("manifest of {} files -> {out}", files.len());
    let body = ManifestOut {
        ok: true,
        out: out.to_string(),
        issuer: issuer.to_string(),
        files,
    };
    output::print(&body, true, &summary)
}
