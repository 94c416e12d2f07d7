//! Canonical request signing.
//!
//! A signed request is a [`Signed<T>`]: the request body `T` flattened into
//! the JSON object, plus a `sign` field. The signature covers the canonical
//! bytes of `T` alone, so the signature field is excluded because it is not
//! part of the type being signed, not because someone remembered to blank it.
//!
//! Canonical bytes are compact JSON with object keys sorted
//! lexicographically at every depth. Field order in the incoming JSON, or in
//! the Rust struct, does not matter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crypto::{parse_verifying_key, sign_base64, verify_signature, SigningKeypair};
use crate::error::{EngineError, EngineResult};

/// A request body that can be signed.
pub trait Signable: Serialize {
    /// The organization whose key signs this request.
    fn signer(&self) -> &str;

    /// Sorted-key compact JSON of the body.
    fn canonical_bytes(&self) -> EngineResult<Vec<u8>> {
        let value = serde_json::to_value(self)
            .map_err(|e| EngineError::validation(format!("request is not serializable: {e}")))?;
        serde_json::to_vec(&canonicalize(value))
            .map_err(|e| EngineError::validation(format!("request is not serializable: {e}")))
    }
}

/// Rebuild every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// A request body plus its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed<T> {
    #[serde(flatten)]
    pub body: T,
    #[serde(default)]
    pub sign: String,
}

impl<T: Signable> Signed<T> {
    /// Sign `body` with `keypair`.
    pub fn sign(body: T, keypair: &SigningKeypair) -> EngineResult<Self> {
        let sign = sign_base64(keypair, &body.canonical_bytes()?);
        Ok(Self { body, sign })
    }

    /// Verify against a PEM signing key.
    ///
    /// `SIGNATURE_INVALID` on mismatch (or a missing signature),
    /// `VERIFICATION_ERROR` on a malformed one, `INVALID_KEY_FORMAT` if the
    /// key does not parse.
    pub fn verify(&self, sign_public_key_pem: &str) -> EngineResult<()> {
        if self.sign.trim().is_empty() {
            return Err(EngineError::SignatureInvalid("request is not signed".into()));
        }
        let key = parse_verifying_key(sign_public_key_pem)?;
        if !verify_signature(&self.body.canonical_bytes()?, &self.sign, &key)? {
            return Err(EngineError::SignatureInvalid(format!(
                "request signature does not verify for organization {:?}",
                self.body.signer()
            )));
        }
        Ok(())
    }
}
