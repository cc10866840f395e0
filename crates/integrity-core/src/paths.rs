//! Path list helpers.

use std::collections::HashSet;

/// Keep the first occurrence of every path, in order of first appearance.
///
/// Paths are compared as plain strings; no canonicalization happens, so
/// `a.txt` and `./a.txt` are distinct entries.
pub fn dedup_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(paths.len());
    let mut out = Vec::with_capacity(paths.len());
    for p in paths {
        let p = p.as_ref();
        if seen.insert(p) {
            out.push(p.to_string());
        }
    }
    out
}
