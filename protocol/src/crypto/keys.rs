//! # Key Management
//!
//! Organizations hold two keypairs:
//!
//! - a [`SigningKeypair`] (Ed25519) used to sign requests and asset
//!   bindings, published as `signPublicKey`;
//! - a [`SealingKeypair`] (X25519) that private logs are sealed to,
//!   published as `publicKey`.
//!
//! Every asset pool also has a [`SealingKeypair`]; its public half is stored
//! on the pool and the engine seals asset addresses to it.
//!
//! ## PEM
//!
//! Public keys are exchanged as PEM `PUBLIC KEY` blocks wrapping a DER
//! SubjectPublicKeyInfo. For the two algorithms we support, the SPKI is a
//! fixed 12-byte prefix followed by the 32 raw key bytes, so parsing is a
//! prefix comparison rather than a general ASN.1 decoder:
//!
//! ```text
//! Ed25519: 30 2a 30 05 06 03 2b 65 70 03 21 00 || key
//! X25519:  30 2a 30 05 06 03 2b 65 6e 03 21 00 || key
//! ```
//!
//! Private keys are never serialized by this module and never logged.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::{CryptoError, CryptoResult};
use crate::config::VERIFYING_KEY_LENGTH;

const PEM_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_END: &str = "-----END PUBLIC KEY-----";
const PEM_LINE_WIDTH: usize = 64;

const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

// ---------------------------------------------------------------------------
// Signing keys (Ed25519)
// ---------------------------------------------------------------------------

/// An organization's Ed25519 signing keypair.
pub struct SigningKeypair {
    signing_key: SigningKey,
}

impl SigningKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Tests and key derivation
    /// only; a weak seed gives a weak key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The verifying key as a PEM `PUBLIC KEY` block.
    pub fn public_key_pem(&self) -> String {
        encode_public_key_pem(&PublicKeyMaterial::Signing(self.verifying_key()))
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeypair")
            .field("public", &hex::encode(self.verifying_key().as_bytes()))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Sealing keys (X25519)
// ---------------------------------------------------------------------------

/// An X25519 keypair that sealed boxes are addressed to.
///
/// Uses `StaticSecret` rather than `EphemeralSecret`: a pool key has to
/// open every address ever sealed to it.
pub struct SealingKeypair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl SealingKeypair {
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(secret))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> X25519PublicKey {
        self.public
    }

    pub fn public_key_pem(&self) -> String {
        encode_public_key_pem(&PublicKeyMaterial::Encryption(self.public))
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

impl std::fmt::Debug for SealingKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKeypair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Public key parsing
// ---------------------------------------------------------------------------

/// A parsed public key of either supported algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyMaterial {
    /// Ed25519 verifying key (organization `signPublicKey`).
    Signing(VerifyingKey),
    /// X25519 public key (pool or organization `publicKey`).
    Encryption(X25519PublicKey),
}

/// Parse a PEM (or bare base64) SubjectPublicKeyInfo.
///
/// Fails with [`CryptoError::InvalidKeyFormat`] on a malformed envelope,
/// bad base64, an unexpected DER layout, or an unsupported algorithm.
pub fn parse_public_key(pem: &str) -> CryptoResult<PublicKeyMaterial> {
    let der = STANDARD
        .decode(pem_body(pem)?)
        .map_err(|_| invalid("body is not valid base64"))?;

    if der.len() != ED25519_SPKI_PREFIX.len() + VERIFYING_KEY_LENGTH {
        return Err(invalid("unexpected SubjectPublicKeyInfo length"));
    }
    let (prefix, raw) = der.split_at(ED25519_SPKI_PREFIX.len());
    let mut key = [0u8; 32];
    key.copy_from_slice(raw);

    if prefix == ED25519_SPKI_PREFIX {
        let verifying = VerifyingKey::from_bytes(&key)
            .map_err(|_| invalid("not a valid Ed25519 point"))?;
        Ok(PublicKeyMaterial::Signing(verifying))
    } else if prefix == X25519_SPKI_PREFIX {
        Ok(PublicKeyMaterial::Encryption(X25519PublicKey::from(key)))
    } else {
        Err(invalid("unsupported key algorithm"))
    }
}

/// Parse a key that must be an Ed25519 verifying key.
pub fn parse_verifying_key(pem: &str) -> CryptoResult<VerifyingKey> {
    match parse_public_key(pem)? {
        PublicKeyMaterial::Signing(key) => Ok(key),
        PublicKeyMaterial::Encryption(_) => Err(invalid("expected an Ed25519 signing key")),
    }
}

/// Parse a key that must be an X25519 encryption key.
pub fn parse_encryption_key(pem: &str) -> CryptoResult<X25519PublicKey> {
    match parse_public_key(pem)? {
        PublicKeyMaterial::Encryption(key) => Ok(key),
        PublicKeyMaterial::Signing(_) => Err(invalid("expected an X25519 encryption key")),
    }
}

/// Encode a public key as a PEM `PUBLIC KEY` block with 64-column lines.
pub fn encode_public_key_pem(material: &PublicKeyMaterial) -> String {
    let (prefix, raw) = match material {
        PublicKeyMaterial::Signing(key) => (ED25519_SPKI_PREFIX, *key.as_bytes()),
        PublicKeyMaterial::Encryption(key) => (X25519_SPKI_PREFIX, *key.as_bytes()),
    };
    let mut der = Vec::with_capacity(prefix.len() + raw.len());
    der.extend_from_slice(&prefix);
    der.extend_from_slice(&raw);

    let body = STANDARD.encode(der);
    let mut pem = String::from(PEM_BEGIN);
    pem.push('\n');
    for chunk in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII, so byte chunks are valid UTF-8.
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(PEM_END);
    pem.push('\n');
    pem
}

/// Extract the base64 body from a PEM block, or accept a bare body as-is.
fn pem_body(input: &str) -> CryptoResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty key"));
    }

    if !trimmed.starts_with("-----") {
        return Ok(trimmed.split_whitespace().collect());
    }

    let mut lines = trimmed.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next() != Some(PEM_BEGIN) {
        return Err(invalid("missing BEGIN PUBLIC KEY header"));
    }

    let mut body = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line == PEM_END {
            closed = true;
            break;
        }
        if line.starts_with("-----") {
            return Err(invalid("unexpected PEM boundary"));
        }
        body.push_str(line);
    }
    if !closed {
        return Err(invalid("missing END PUBLIC KEY footer"));
    }
    if lines.next().is_some() {
        return Err(invalid("trailing data after PEM footer"));
    }
    Ok(body)
}

fn invalid(reason: &str) -> CryptoError {
    CryptoError::InvalidKeyFormat(reason.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
