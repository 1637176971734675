//! Salted credential digests
//!
//! Stored form is `<salt>$<hex(sha256(salt || secret))>` with a random
//! per-user salt.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SEPARATOR: char = '$';

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the stored form of `secret` with a fresh salt
pub fn derive_credential(secret: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hashed = digest(&salt, secret);
    format!("{}{}{}", salt, SEPARATOR, hashed)
}

/// Check `secret` against a stored credential in constant time
pub fn verify_credential(stored: &str, secret: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let actual = digest(salt, secret);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
