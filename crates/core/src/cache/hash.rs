//! Cache key construction.
//!
//! An entry key is the request method plus the full URL, query string
//! included, so `app.js?v=4` and `app.js?v=5` never collide.

use sha2::{Digest, Sha256};

/// Human-readable entry key: `METHOD URL`.
pub fn entry_key(method: &str, url: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), url)
}

/// Compute the stored hash for an entry key.
pub fn compute_key_hash(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
