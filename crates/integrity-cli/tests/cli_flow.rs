//! cli_flow.rs
//!
//! Drives the `integrity` binary end to end: sign/verify and
//! manifest/verify-manifest inside a scratch directory.

use std::fs;
use std::path::Path;

use assert_cmd::Command;

const ISSUER: &str = "cli_issuer";
const PRIVATE_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../integrity-core/tests/fixtures/test_rsa_private.pem");
const PRIVATE_KEY_PKCS8: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../integrity-core/tests/fixtures/test_rsa_private_pkcs8.pem"
);
const PUBLIC_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../integrity-core/tests/fixtures/test_rsa_public.pem");

fn integrity(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("integrity").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn stdout_json(out: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn sign_then_verify() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), b"Hello, I am some test file data.").unwrap();

    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--key", PRIVATE_KEY, "--issuer", ISSUER])
        .assert()
        .success();
    assert!(dir.path().join(".integrity").exists());

    let out = integrity(dir.path())
        .args(["--json", "verify", "--in", "data.txt", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["ok"], true);
    assert_eq!(
        v["files"]["data.txt"],
        "15c416d7bd9890f5cbcc875122837ad3f14a2589d1d163b0a685c86870082270"
    );
}

#[test]
fn pkcs8_key_signs_too() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), b"payload").unwrap();

    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--out", "data.integrity", "--key", PRIVATE_KEY_PKCS8, "--issuer", ISSUER])
        .assert()
        .success();
    integrity(dir.path())
        .args(["verify", "--in", "data.txt", "--token", "data.integrity", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .assert()
        .success();
}

#[test]
fn tampered_file_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    fs::write(&data, b"original").unwrap();

    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--key", PRIVATE_KEY, "--issuer", ISSUER])
        .assert()
        .success();
    fs::write(&data, b"modified").unwrap();

    let out = integrity(dir.path())
        .args(["--json", "verify", "--in", "data.txt", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["ok"], false);
    assert_eq!(v["kind"], "digest-mismatch");
}

#[test]
fn failure_is_reported_once_in_human_mode() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    fs::write(&data, b"original").unwrap();

    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--key", PRIVATE_KEY, "--issuer", ISSUER])
        .assert()
        .success();
    fs::write(&data, b"modified").unwrap();

    let out = integrity(dir.path())
        .env("RUST_LOG", "off")
        .args(["verify", "--in", "data.txt", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.matches("FAILED").count(), 1);
    assert!(stdout.contains("digests do not match for data.txt"));
    assert!(out.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn setup_errors_still_reach_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let out = integrity(dir.path())
        .env("RUST_LOG", "off")
        .args(["verify", "--in", "data.txt", "--key", "nope.pem", "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("nope.pem"));
}

#[test]
fn wrong_issuer_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), b"payload").unwrap();

    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--key", PRIVATE_KEY, "--issuer", ISSUER])
        .assert()
        .success();
    integrity(dir.path())
        .args(["verify", "--in", "data.txt", "--key", PUBLIC_KEY, "--issuer", "someone_else"])
        .assert()
        .failure();
}

#[test]
fn manifest_then_verify_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
    fs::write(dir.path().join("docs").join("b.md"), b"# beta\n").unwrap();
    fs::write(dir.path().join("empty"), b"").unwrap();

    let out = integrity(dir.path())
        .args(["--json", "manifest", "a.txt", "docs/b.md", "empty", "a.txt"])
        .args(["--key", PRIVATE_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["files"].as_array().unwrap().len(), 3);

    let out = integrity(dir.path())
        .args(["--json", "verify-manifest", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["ok"], true);
    assert_eq!(v["files"].as_object().unwrap().len(), 3);

    fs::write(dir.path().join("docs").join("b.md"), b"# gamma\n").unwrap();
    let out = integrity(dir.path())
        .args(["--json", "verify-manifest", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert_eq!(stdout_json(&out)["kind"], "digest-mismatch");
}

#[test]
fn recursive_manifest_skips_its_own_token() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("tree")).unwrap();
    fs::write(dir.path().join("tree").join("x.txt"), b"x").unwrap();
    fs::write(dir.path().join("tree").join("y.txt"), b"y").unwrap();

    let out = integrity(dir.path())
        .args(["--json", "manifest", "-r", "tree", "--out", "tree/.integrity"])
        .args(["--key", PRIVATE_KEY, "--issuer", ISSUER])
        .output()
        .unwrap();
    assert!(out.status.success());
    let files = stdout_json(&out)["files"].clone();
    assert_eq!(files, serde_json::json!(["tree/x.txt", "tree/y.txt"]));

    integrity(dir.path())
        .args(["verify-manifest", "--root", "tree", "--key", PUBLIC_KEY, "--issuer", ISSUER])
        .assert()
        .success();
}

#[test]
fn missing_key_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), b"payload").unwrap();
    integrity(dir.path())
        .args(["sign", "--in", "data.txt", "--key", "nope.pem", "--issuer", ISSUER])
        .assert()
        .failure();
}
