use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Persist token bytes, replacing any previous token at `path`.
pub fn write_token<P: AsRef<Path>>(path: P, token: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(anyhow!("must specify a valid path to an output file"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, token).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
