//! Asset binding signatures.
//!
//! Every asset carries a signature, by the organization that minted it, over
//! `(poolId, address, assetTypeId)`. Spending an asset out of a pool requires
//! that signature to verify for *that* pool, so an asset record can't be
//! re-pointed at another pool, retyped, or fabricated by anyone without the
//! minter's signing key. A bare hash of those fields (which anyone can
//! compute) is not accepted.
//!
//! [`VerifiedBinding`] can only be obtained by verifying, so the mint path
//! takes one as proof that the check happened.

use ed25519_dalek::VerifyingKey;

use crate::config::{BINDING_DOMAIN, PART_SEPARATOR};
use crate::crypto::{parse_verifying_key, sign_base64, verify_signature, SigningKeypair};
use crate::error::{EngineError, EngineResult};
use crate::store::{Asset, Organization};

/// The exact bytes a binding signature covers.
pub fn binding_message(pool_id: &str, address: &str, asset_type_id: &str) -> Vec<u8> {
    let mut msg = String::with_capacity(
        BINDING_DOMAIN.len() + pool_id.len() + address.len() + asset_type_id.len() + 3,
    );
    msg.push_str(BINDING_DOMAIN);
    for part in [pool_id, address, asset_type_id] {
        msg.push(PART_SEPARATOR);
        msg.push_str(part);
    }
    msg.into_bytes()
}

/// Produce a binding signature (client side).
pub fn sign_binding(
    keypair: &SigningKeypair,
    pool_id: &str,
    address: &str,
    asset_type_id: &str,
) -> String {
    sign_base64(keypair, &binding_message(pool_id, address, asset_type_id))
}

/// Whether an existing asset's binding verifies for `pool_id` under the
/// minter's key. Malformed signatures count as invalid.
pub fn binding_is_valid(asset: &Asset, pool_id: &str, minter_key: &VerifyingKey) -> bool {
    let msg = binding_message(pool_id, &asset.address, &asset.asset_type_id);
    matches!(verify_signature(&msg, &asset.sign, minter_key), Ok(true))
}

/// A binding whose signature has been checked against the minter's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedBinding {
    pool_id: String,
    address: String,
    asset_type_id: String,
    minter: String,
    sign: String,
}

impl VerifiedBinding {
    /// Check `sign` over `(pool_id, address, asset_type_id)` against the
    /// minter's signing key.
    ///
    /// A mismatch is `SIGNATURE_INVALID`; an unparseable signature is
    /// `VERIFICATION_ERROR`.
    pub fn verify(
        pool_id: &str,
        address: &str,
        asset_type_id: &str,
        minter: &Organization,
        sign: &str,
    ) -> EngineResult<Self> {
        let key = parse_verifying_key(&minter.sign_public_key)?;
        let msg = binding_message(pool_id, address, asset_type_id);
        if !verify_signature(&msg, sign, &key)? {
            return Err(EngineError::SignatureInvalid(format!(
                "binding signature for output {address:?} does not verify for pool {pool_id:?}"
            )));
        }
        Ok(Self {
            pool_id: pool_id.to_string(),
            address: address.to_string(),
            asset_type_id: asset_type_id.to_string(),
            minter: minter.org_id.clone(),
            sign: sign.to_string(),
        })
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn asset_type_id(&self) -> &str {
        &self.asset_type_id
    }

    pub fn minter(&self) -> &str {
        &self.minter
    }

    pub fn sign(&self) -> &str {
        &self.sign
    }
}
