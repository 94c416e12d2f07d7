//! # Sealed-Box Encryption
//!
//! Anyone can seal data to a public key; only the matching secret opens it.
//! This is how Tessera keeps the pool index confidential: the engine seals
//! each asset address to the destination pool's X25519 key, and the pool's
//! owner later finds its assets by opening index entries with the secret.
//! Private audit logs are sealed the same way to the organization key.
//!
//! ## Construction
//!
//! 1. Fresh ephemeral X25519 secret `e`, public `E`.
//! 2. `shared = X25519(e, recipient)`; a non-contributory (all-zero) result
//!    means the recipient key is a low-order point and sealing is refused.
//! 3. `key = BLAKE3.derive_key(SEALED_BOX_KDF_CONTEXT, shared || E || recipient)`.
//! 4. AES-256-GCM with a random 96-bit nonce, AAD = `E || recipient`.
//!
//! ## Wire format
//!
//! `base64( E (32) || nonce (12) || ciphertext || tag (16) )`
//!
//! Sealing is randomized: sealing the same plaintext twice gives two
//! different ciphertexts. Callers that need to find an entry again must keep
//! the ciphertext they got back; they cannot recompute it.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};

use super::keys::SealingKeypair;
use super::{CryptoError, CryptoResult};
use crate::config::{
    AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH, ENCRYPTION_KEY_LENGTH,
    SEALED_BOX_KDF_CONTEXT,
};

const HEADER_LENGTH: usize = ENCRYPTION_KEY_LENGTH + AES_NONCE_LENGTH;

/// Seal `plaintext` to `recipient`, returning base64 ciphertext.
///
/// Fails with [`CryptoError::Encryption`] if the plaintext is longer than
/// `max_plaintext` bytes or the recipient key is degenerate.
pub fn seal_for_key(
    recipient: &X25519PublicKey,
    plaintext: &[u8],
    max_plaintext: usize,
) -> CryptoResult<String> {
    if plaintext.len() > max_plaintext {
        return Err(CryptoError::Encryption(format!(
            "plaintext of {} bytes exceeds the {max_plaintext}-byte limit",
            plaintext.len()
        )));
    }

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(CryptoError::Encryption(
            "recipient key is a low-order point".into(),
        ));
    }

    let key = derive_box_key(shared.as_bytes(), &ephemeral_public, recipient);
    let aad = box_aad(&ephemeral_public, recipient);

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| CryptoError::Encryption("cipher initialization failed".into()))?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".into()))?;

    let mut out = Vec::with_capacity(HEADER_LENGTH + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(out))
}

/// Open a box produced by [`seal_for_key`] with the recipient's keypair.
///
/// Every failure (bad base64, truncation, wrong key, tampering) is the same
/// [`CryptoError::Decryption`].
pub fn open_sealed(recipient: &SealingKeypair, sealed: &str) -> CryptoResult<Vec<u8>> {
    let data = STANDARD
        .decode(sealed.trim())
        .map_err(|_| CryptoError::Decryption)?;
    if data.len() < HEADER_LENGTH + AES_TAG_LENGTH {
        return Err(CryptoError::Decryption);
    }

    let (ephemeral_bytes, rest) = data.split_at(ENCRYPTION_KEY_LENGTH);
    let (nonce_bytes, ciphertext) = rest.split_at(AES_NONCE_LENGTH);

    let mut ephemeral = [0u8; ENCRYPTION_KEY_LENGTH];
    ephemeral.copy_from_slice(ephemeral_bytes);
    let ephemeral_public = X25519PublicKey::from(ephemeral);
    let recipient_public = recipient.public_key();

    let shared = recipient.secret().diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(CryptoError::Decryption);
    }

    let key = derive_box_key(shared.as_bytes(), &ephemeral_public, &recipient_public);
    let aad = box_aad(&ephemeral_public, &recipient_public);

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| CryptoError::Decryption)
}

/// BLAKE3 `derive_key` over the DH output and both public keys, so the box
/// key is bound to this exact (ephemeral, recipient) pair.
fn derive_box_key(
    shared: &[u8; 32],
    ephemeral: &X25519PublicKey,
    recipient: &X25519PublicKey,
) -> [u8; AES_KEY_LENGTH] {
    let mut hasher = blake3::Hasher::new_derive_key(SEALED_BOX_KDF_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral.as_bytes());
    hasher.update(recipient.as_bytes());
    *hasher.finalize().as_bytes()
}

fn box_aad(ephemeral: &X25519PublicKey, recipient: &X25519PublicKey) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(ephemeral.as_bytes());
    aad[32..].copy_from_slice(recipient.as_bytes());
    aad
}
