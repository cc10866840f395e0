//! PEM key loading.
//!
//! Private keys: PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`).
//! Public keys: SubjectPublicKeyInfo (`PUBLIC KEY`) or PKCS#1 (`RSA PUBLIC KEY`).

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::digest::read_file;
use crate::errors::{IntegrityError, IntegrityResult};

pub fn private_key_from_pem(pem: &str) -> IntegrityResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| IntegrityError::key(format!("not a PKCS#8 or PKCS#1 RSA private key: {e}")))
}

pub fn public_key_from_pem(pem: &str) -> IntegrityResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| IntegrityError::key(format!("not an SPKI or PKCS#1 RSA public key: {e}")))
}

pub fn load_private_key<P: AsRef<Path>>(path: P) -> IntegrityResult<RsaPrivateKey> {
    private_key_from_pem(&read_pem(path.as_ref())?)
}

pub fn load_public_key<P: AsRef<Path>>(path: P) -> IntegrityResult<RsaPublicKey> {
    public_key_from_pem(&read_pem(path.as_ref())?)
}

fn read_pem(path: &Path) -> IntegrityResult<String> {
    String::from_utf8(read_file(path)?)
        .map_err(|_| IntegrityError::key(format!("{} is not valid PEM text", path.display())))
}
