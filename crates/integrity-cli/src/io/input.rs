use std::path::Path;

use anyhow::{anyhow, Context, Result};
use walkdir::WalkDir;

use integrity_core::keys::{load_private_key, load_public_key};
use integrity_core::{RsaPrivateKey, RsaPublicKey};

pub fn signing_key(path: &str) -> Result<RsaPrivateKey> {
    if path.is_empty() {
        return Err(anyhow!("must specify a valid path to a PEM-encoded PKCS8/RSA private key file"));
    }
    load_private_key(path).with_context(|| format!("loading signing key {path}"))
}

pub fn verifying_key(path: &str) -> Result<RsaPublicKey> {
    if path.is_empty() {
        return Err(anyhow!("must specify a valid path to a PEM-encoded public key file"));
    }
    load_public_key(path).with_context(|| format!("loading public key {path}"))
}

/// Resolve manifest arguments into file paths.
///
/// Without `recursive`, arguments are passed through untouched. With it,
/// directories expand to the regular files below them in file-name order, and
/// `exclude` (the token being written) is left out.
pub fn collect_paths(args: &[String], recursive: bool, exclude: &Path) -> Result<Vec<String>> {
    if !recursive {
        return Ok(args.to_vec());
    }

    let mut out = Vec::new();
    for arg in args {
        let p = Path::new(arg);
        if !p.is_dir() {
            out.push(arg.clone());
            continue;
        }
        for entry in WalkDir::new(p).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {arg}"))?;
            if !entry.file_type().is_file() || same_path(entry.path(), exclude) {
                continue;
            }
            let s = entry
                .path()
                .to_str()
                .ok_or_else(|| anyhow!("non-utf8 path under {arg}"))?;
            out.push(s.to_string());
        }
    }
    Ok(out)
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
