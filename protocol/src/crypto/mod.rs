//! # Cryptographic Primitives for Tessera
//!
//! Every signature check, every sealed address, and every attach-hash flows
//! through here. The engine never touches `ed25519-dalek`, `x25519-dalek`,
//! or `aes-gcm` directly; it calls this module.
//!
//! The choices are deliberately boring:
//!
//! - **Ed25519** for organization signatures (requests and asset bindings).
//! - **X25519 + BLAKE3 KDF + AES-256-GCM** as a sealed box, so anyone can
//!   encrypt an asset address to a pool (or a log to an organization) but
//!   only the private-key holder can read it.
//! - **SHA-256** for attach-hashes and credential fingerprints.
//!
//! Public keys travel as PEM `PUBLIC KEY` blocks (SubjectPublicKeyInfo), the
//! format organizations already hand around. Parsing accepts the bare base64
//! body as well, since older clients stripped the envelope.

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signatures;

use thiserror::Error;

pub use encryption::{open_sealed, seal_for_key};
pub use hash::{hash_base64, sha256, sha256_hex};
pub use keys::{
    parse_encryption_key, parse_public_key, parse_verifying_key, PublicKeyMaterial,
    SealingKeypair, SigningKeypair,
};
pub use signatures::{sign_base64, verify_signature};

/// Errors raised by the crypto layer.
///
/// Messages stay vague on purpose: "wrong key" and "corrupted ciphertext"
/// are the same failure as far as a caller is concerned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decryption,

    #[error("signature could not be checked: {0}")]
    Verification(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
