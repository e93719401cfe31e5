//! Salted password hashing.
//!
//! Stored form is `salt$hex(sha256(salt || password))` with a random
//! UUID v4 salt per account.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const SEPARATOR: char = '$';

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash `password` with a fresh salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", salt, SEPARATOR, digest(&salt, password))
}

/// Check `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once(SEPARATOR) {
        Some((salt, expected)) if !salt.is_empty() => digest(salt, password) == expected,
        _ => false,
    }
}
