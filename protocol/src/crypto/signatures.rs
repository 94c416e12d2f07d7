//! # Digital Signatures
//!
//! Ed25519 signing and verification over canonical payload bytes, with
//! signatures carried as base64 strings in JSON requests.
//!
//! Verification distinguishes two failures, and callers should too:
//!
//! - `Ok(false)`: the signature is well-formed but does not match. The
//!   orchestrator reports this as `SIGNATURE_INVALID`.
//! - `Err(CryptoError::Verification)`: the signature could not even be
//!   checked (bad base64, wrong length). Reported as `VERIFICATION_ERROR`.
//!
//! Verification is strict (`verify_strict`): small-order keys and
//! non-canonical signatures are rejected.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey};

use super::keys::SigningKeypair;
use super::{CryptoError, CryptoResult};
use crate::config::SIGNATURE_LENGTH;

/// Sign `message` and return the signature as base64.
pub fn sign_base64(keypair: &SigningKeypair, message: &[u8]) -> String {
    STANDARD.encode(keypair.sign(message).to_bytes())
}

/// Check a base64 signature over `message` against `key`.
pub fn verify_signature(
    message: &[u8],
    signature_b64: &str,
    key: &VerifyingKey,
) -> CryptoResult<bool> {
    let bytes = STANDARD
        .decode(signature_b64.trim())
        .map_err(|_| CryptoError::Verification("signature is not valid base64".into()))?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(CryptoError::Verification(format!(
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    let signature = Signature::from_slice(&bytes)
        .map_err(|_| CryptoError::Verification("malformed signature".into()))?;
    Ok(key.verify_strict(message, &signature).is_ok())
}
