//! # Organization Wallet
//!
//! The client half of the protocol. An [`OrgWallet`] holds an
//! organization's keys (signing, sealing, and one sealing key per pool it
//! owns) and does the things only a key holder can do:
//!
//! - build and sign `addOrganization`, `initPool`, `registerAssetType`,
//!   `issue`, and `transfer` requests, including the binding signatures for
//!   every output address;
//! - walk a pool's sealed index and recover which addresses it owns, in the
//!   [`CandidateRef`] form a transfer's side channel expects;
//! - open the organization's sealed private logs.
//!
//! The engine never sees any of these secrets.
//!
//! ## Addresses
//!
//! Asset addresses are caller-chosen and must be globally unique;
//! [`OrgWallet::fresh_address`] draws a random UUID. Reusing an address is
//! rejected by the engine as `ALREADY_EXISTS`, which also makes a replayed
//! request harmless.

use std::collections::HashMap;

use crate::crypto::{open_sealed, SealingKeypair, SigningKeypair};
use crate::error::{EngineError, EngineResult};
use crate::pool::{sign_binding, CandidateRef};
use crate::store::{AssetAddressIndex, LogAddress, OrgPrivateLog, SealedLog};
use crate::transaction::{
    AssetTypeRequest, IssueRequest, OrganizationRequest, PoolRequest, Signed, TransferRequest,
};

// ---------------------------------------------------------------------------
// Transfer drafts
// ---------------------------------------------------------------------------

/// The caller-chosen parts of a transfer, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub from_pool: String,
    pub to_pool: String,
    pub asset_type_id: String,
    pub amount: i64,
    pub output_address: String,
    pub change_address: String,
    pub log_info: String,
    pub mod_user: String,
}

impl TransferDraft {
    /// A draft with fresh output and change addresses.
    pub fn new(from_pool: &str, to_pool: &str, asset_type_id: &str, amount: i64) -> Self {
        Self {
            from_pool: from_pool.to_string(),
            to_pool: to_pool.to_string(),
            asset_type_id: asset_type_id.to_string(),
            amount,
            output_address: OrgWallet::fresh_address(),
            change_address: OrgWallet::fresh_address(),
            log_info: String::new(),
            mod_user: String::new(),
        }
    }

    pub fn with_log_info(mut self, log_info: &str) -> Self {
        self.log_info = log_info.to_string();
        self
    }

    pub fn with_mod_user(mut self, mod_user: &str) -> Self {
        self.mod_user = mod_user.to_string();
        self
    }

    pub fn with_addresses(mut self, output: &str, change: &str) -> Self {
        self.output_address = output.to_string();
        self.change_address = change.to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// OrgWallet
// ---------------------------------------------------------------------------

pub struct OrgWallet {
    org_id: String,
    signing: SigningKeypair,
    sealing: SealingKeypair,
    pools: HashMap<String, SealingKeypair>,
}

impl OrgWallet {
    /// A wallet with freshly generated keys.
    pub fn generate(org_id: &str) -> Self {
        Self::from_keys(org_id, SigningKeypair::generate(), SealingKeypair::generate())
    }

    pub fn from_keys(org_id: &str, signing: SigningKeypair, sealing: SealingKeypair) -> Self {
        Self {
            org_id: org_id.to_string(),
            signing,
            sealing,
            pools: HashMap::new(),
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn signing_key(&self) -> &SigningKeypair {
        &self.signing
    }

    pub fn pool_key(&self, pool_id: &str) -> Option<&SealingKeypair> {
        self.pools.get(pool_id)
    }

    /// Take custody of an existing pool key.
    pub fn adopt_pool(&mut self, pool_id: &str, key: SealingKeypair) {
        self.pools.insert(pool_id.to_string(), key);
    }

    /// A random, globally unique asset address.
    pub fn fresh_address() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // -- Requests ------------------------------------------------------------

    /// Self-signed registration. `network_identity` defaults (server side)
    /// to the caller's credential fingerprint.
    pub fn organization_request(
        &self,
        network_identity: Option<&str>,
    ) -> EngineResult<Signed<OrganizationRequest>> {
        Signed::sign(
            OrganizationRequest {
                org_id: self.org_id.clone(),
                public_key: self.sealing.public_key_pem(),
                sign_public_key: self.signing.public_key_pem(),
                network_identity: network_identity.unwrap_or_default().to_string(),
            },
            &self.signing,
        )
    }

    /// Generate a key for a new pool, keep it, and sign the `initPool`
    /// request.
    pub fn create_pool(&mut self, pool_id: &str, pool_type: &str) -> EngineResult<Signed<PoolRequest>> {
        let key = SealingKeypair::generate();
        let request = Signed::sign(
            PoolRequest {
                org_id: self.org_id.clone(),
                pool_id: pool_id.to_string(),
                pool_type: pool_type.to_string(),
                public_key: key.public_key_pem(),
            },
            &self.signing,
        )?;
        self.pools.insert(pool_id.to_string(), key);
        Ok(request)
    }

    /// `total_supply` of 0 registers an uncapped type.
    pub fn asset_type_request(
        &self,
        asset_type_id: &str,
        asset_name: &str,
        asset_symbol: &str,
        decimals: u8,
        total_supply: i64,
    ) -> EngineResult<Signed<AssetTypeRequest>> {
        Signed::sign(
            AssetTypeRequest {
                org_id: self.org_id.clone(),
                asset_type_id: asset_type_id.to_string(),
                asset_name: asset_name.to_string(),
                asset_symbol: asset_symbol.to_string(),
                decimals,
                total_supply,
            },
            &self.signing,
        )
    }

    pub fn issue_request(
        &self,
        to_pool: &str,
        asset_type_id: &str,
        amount: i64,
        address: &str,
    ) -> EngineResult<Signed<IssueRequest>> {
        Signed::sign(
            IssueRequest {
                org_id: self.org_id.clone(),
                to_pool: to_pool.to_string(),
                asset_type_id: asset_type_id.to_string(),
                amount,
                new_asset_addr: address.to_string(),
                new_asset_sign: sign_binding(&self.signing, to_pool, address, asset_type_id),
                log_info: String::new(),
            },
            &self.signing,
        )
    }

    pub fn transfer_request(&self, draft: &TransferDraft) -> EngineResult<Signed<TransferRequest>> {
        let output_sign = sign_binding(
            &self.signing,
            &draft.to_pool,
            &draft.output_address,
            &draft.asset_type_id,
        );
        let change_sign = sign_binding(
            &self.signing,
            &draft.from_pool,
            &draft.change_address,
            &draft.asset_type_id,
        );
        Signed::sign(
            TransferRequest {
                org_id: self.org_id.clone(),
                from_pool: draft.from_pool.clone(),
                to_pool: draft.to_pool.clone(),
                asset_type_id: draft.asset_type_id.clone(),
                amount: draft.amount,
                new_asset_addrs: vec![draft.output_address.clone(), draft.change_address.clone()],
                new_asset_signs: vec![output_sign, change_sign],
                log_info: draft.log_info.clone(),
                mod_user: draft.mod_user.clone(),
            },
            &self.signing,
        )
    }

    // -- Reading sealed state ------------------------------------------------

    /// Unspent entries of `pool_id`'s index this wallet can open, for
    /// `asset_type_id`. Entries that fail to open are skipped: they belong
    /// to a different key.
    pub fn owned_candidates(
        &self,
        pool_id: &str,
        asset_type_id: &str,
        index: &[AssetAddressIndex],
    ) -> Vec<CandidateRef> {
        let Some(key) = self.pools.get(pool_id) else {
            return Vec::new();
        };
        index
            .iter()
            .filter(|e| e.pool_id == pool_id && !e.spent && e.asset_type_id == asset_type_id)
            .filter_map(|e| {
                let address = String::from_utf8(open_sealed(key, &e.encrypted_address).ok()?).ok()?;
                Some(CandidateRef {
                    address,
                    index_id: e.encrypted_address.clone(),
                })
            })
            .collect()
    }

    /// The transient side-channel value carrying `refs`.
    pub fn candidates_transient(refs: &[CandidateRef]) -> EngineResult<Vec<u8>> {
        serde_json::to_vec(refs)
            .map_err(|e| EngineError::validation(format!("candidate list not serializable: {e}")))
    }

    /// Log ids behind this organization's log index entries.
    pub fn recover_log_ids(&self, index: &[LogAddress]) -> Vec<String> {
        index
            .iter()
            .filter(|e| e.org_id == self.org_id)
            .filter_map(|e| String::from_utf8(open_sealed(&self.sealing, &e.encrypted_log_id).ok()?).ok())
            .collect()
    }

    /// Decrypt one of this organization's private logs.
    pub fn open_log(&self, sealed: &SealedLog) -> EngineResult<OrgPrivateLog> {
        let plaintext = open_sealed(&self.sealing, &sealed.ciphertext)?;
        serde_json::from_slice(&plaintext).map_err(|e| EngineError::CorruptRecord {
            entity: "orgPrivateLog",
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for OrgWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pools: Vec<&String> = self.pools.keys().collect();
        pools.sort();
        f.debug_struct("OrgWallet")
            .field("org_id", &self.org_id)
            .field("pools", &pools)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::seal_for_key;
    use crate::error::ErrorKind;

    #[test]
    fn test_requests_verify_under_wallet_key() {
        let mut wallet = OrgWallet::generate("org1");
        let pem = wallet.signing_key().public_key_pem();

        wallet.organization_request(None).unwrap().verify(&pem).unwrap();
        wallet
            .asset_type_request("USD", "US Dollar", "USD", 2, 0)
            .unwrap()
            .verify(&pem)
            .unwrap();
        wallet.create_pool("pool1", "cash").unwrap().verify(&pem).unwrap();
        wallet
            .issue_request("pool1", "USD", 100, "a1")
            .unwrap()
            .verify(&pem)
            .unwrap();
        let draft = TransferDraft::new("pool1", "pool2", "USD", 40);
        wallet.transfer_request(&draft).unwrap().verify(&pem).unwrap();
        assert!(wallet.pool_key("pool1").is_some());
    }

    #[test]
    fn test_fresh_addresses_are_unique() {
        assert_ne!(OrgWallet::fresh_address(), OrgWallet::fresh_address());
        let draft = TransferDraft::new("p1", "p2", "USD", 1);
        assert_ne!(draft.output_address, draft.change_address);
    }

    #[test]
    fn test_owned_candidates_filters_index() {
        let mut wallet = OrgWallet::generate("org1");
        wallet.create_pool("pool1", "").unwrap();
        let key = wallet.pool_key("pool1").unwrap().public_key();
        let stranger = SealingKeypair::generate().public_key();

        let entry = |addr: &str, to: &x25519_dalek::PublicKey, spent: bool, ty: &str| AssetAddressIndex {
            pool_id: "pool1".into(),
            encrypted_address: seal_for_key(to, addr.as_bytes(), 64).unwrap(),
            asset_type_id: ty.into(),
            spent,
        };
        let index = vec![
            entry("mine", &key, false, "USD"),
            entry("spent", &key, true, "USD"),
            entry("euro", &key, false, "EUR"),
            entry("theirs", &stranger, false, "USD"),
        ];

        let refs = wallet.owned_candidates("pool1", "USD", &index);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].address, "mine");
        assert_eq!(refs[0].index_id, index[0].encrypted_address);
        assert!(wallet.owned_candidates("unknown", "USD", &index).is_empty());
    }

    #[test]
    fn test_open_log_with_wrong_wallet_fails() {
        let wallet = OrgWallet::generate("org1");
        let sealed = SealedLog {
            log_id: "l".into(),
            ciphertext: seal_for_key(&SealingKeypair::generate().public_key(), b"{}", 64).unwrap(),
        };
        assert_eq!(
            wallet.open_log(&sealed).unwrap_err().kind(),
            ErrorKind::DecryptionError
        );
    }
}
