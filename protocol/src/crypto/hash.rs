//! # Hashing Utilities
//!
//! SHA-256 helpers. Tessera hashes in exactly two places:
//!
//! - **Attach-hashes**: `hash_base64([orgId, poolId])` binds a pool to the
//!   organization that created it. Anyone can recompute it; nobody can
//!   change the owner without changing the hash.
//! - **Credential fingerprints**: `sha256_hex(credential)` is how a caller's
//!   certificate is turned into a stable lookup key.
//!
//! Parts are joined with a NUL separator before hashing, so
//! `("ab", "c")` and `("a", "bc")` never collide. Identifiers are validated
//! to be NUL-free before they get here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::config::PART_SEPARATOR;

/// SHA-256 of the input as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of the input, hex-encoded (lowercase).
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// SHA-256 over the NUL-joined parts, base64-encoded.
///
/// ```
/// use tessera_protocol::crypto::hash_base64;
///
/// let a = hash_base64(&["org1", "pool1"]);
/// assert_eq!(a, hash_base64(&["org1", "pool1"]));
/// assert_ne!(a, hash_base64(&["org1p", "ool1"]));
/// ```
pub fn hash_base64(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let mut sep = [0u8; 4];
            hasher.update(PART_SEPARATOR.encode_utf8(&mut sep).as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    STANDARD.encode(hasher.finalize())
}
