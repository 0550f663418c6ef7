//! Salted, iterated SHA-256 password hashes.
//!
//! Stored as `sha256$<iterations>$<salt>$<hash>` with base64url fields.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Rounds used for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

fn derive(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut out = hasher.finalize();

    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(out.as_slice());
        hasher.update(password.as_bytes());
        out = hasher.finalize();
    }

    out.to_vec()
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    hash_with_iterations(password, DEFAULT_ITERATIONS)
}

pub fn hash_with_iterations(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let iterations = iterations.max(1);

    format!(
        "{SCHEME}${iterations}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(derive(password, &salt, iterations))
    )
}

/// A hash of a random secret, for doing the same work when there is no
/// stored hash to check against.
pub fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        let mut secret = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        hash_password(&URL_SAFE_NO_PAD.encode(secret))
    })
}

/// Checks `password` against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(hash))
    else {
        return false;
    };

    constant_time_eq(&derive(password, &salt, iterations.max(1)), &expected)
}
