//! The asset pool engine: pool creation, asset types, minting, burning,
//! candidate loading, eligibility filtering, balance and selection planning.
//!
//! Nothing here checks *who* is asking; that is the orchestrator's job. The
//! engine only guarantees that value is conserved, that spent assets stay
//! spent, and that no write happens before a transfer is known to be
//! fundable.

use std::collections::{HashMap, HashSet};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::binding::VerifiedBinding;
use super::selection::{evaluate, plan_selection, Candidate, SelectionPlan};
use super::CandidateRef;
use crate::config::EngineConfig;
use crate::crypto::{hash_base64, parse_encryption_key, parse_verifying_key, seal_for_key};
use crate::error::{EngineError, EngineResult};
use crate::ledger::StateStore;
use crate::store::{
    Asset, AssetAddressIndex, AssetInfo, AssetPool, EntityStore, Organization,
};

/// `hash(orgId ‖ poolId)`, the value stored as a pool's `attachHash`.
pub fn attach_hash(org_id: &str, pool_id: &str) -> String {
    hash_base64(&[org_id, pool_id])
}

/// A freshly minted asset, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedAsset {
    pub address: String,
    pub pool_id: String,
    /// The pool index key (address sealed to the pool). Needed to spend it.
    pub index_id: String,
    pub value: u64,
}

/// Everything a transfer needs once it has been validated and funded.
#[derive(Debug)]
pub struct TransferPlan {
    pub source: AssetPool,
    pub destination: AssetPool,
    pub inputs: Vec<Candidate>,
    pub amount: u64,
    pub change: u64,
    pub output: VerifiedBinding,
    pub change_output: VerifiedBinding,
}

/// What a transfer did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub burned: Vec<String>,
    pub output: MintedAsset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<MintedAsset>,
}

pub struct PoolEngine<'c> {
    config: &'c EngineConfig,
}

impl<'c> PoolEngine<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    // -- Pools ---------------------------------------------------------------

    /// Create a pool owned by `owner`.
    pub fn init_pool<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        pool_id: &str,
        pool_type: &str,
        public_key_pem: &str,
        owner: &Organization,
    ) -> EngineResult<AssetPool> {
        if store.exists::<AssetPool>(&[pool_id])? {
            return Err(EngineError::AlreadyExists {
                entity: "assetPool",
                key: pool_id.to_string(),
            });
        }
        parse_encryption_key(public_key_pem)?;

        let pool = AssetPool {
            pool_id: pool_id.to_string(),
            pool_type: pool_type.to_string(),
            public_key: public_key_pem.to_string(),
            org_id: owner.org_id.clone(),
            attach_hash: attach_hash(&owner.org_id, pool_id),
        };
        store.insert_new(&pool)?;
        debug!(pool_id, org_id = %owner.org_id, "asset pool created");
        Ok(pool)
    }

    /// Re-derive the pool's attach-hash for `org_id` and compare.
    pub fn verify_pool_owner(&self, pool: &AssetPool, org_id: &str) -> EngineResult<()> {
        if pool.org_id != org_id || pool.attach_hash != attach_hash(org_id, &pool.pool_id) {
            return Err(EngineError::Unauthorized(format!(
                "asset pool {:?} is not bound to organization {org_id:?}",
                pool.pool_id
            )));
        }
        Ok(())
    }

    // -- Asset types ----------------------------------------------------------

    /// Record a new asset type. `ALREADY_EXISTS` if the id is taken.
    pub fn register_asset_type<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        info: AssetInfo,
    ) -> EngineResult<AssetInfo> {
        if store.exists::<AssetInfo>(&[&info.asset_type_id])? {
            return Err(EngineError::AlreadyExists {
                entity: "assetInfo",
                key: info.asset_type_id,
            });
        }
        store.insert_new(&info)?;
        debug!(asset_type_id = %info.asset_type_id, total_supply = info.total_supply, "asset type registered");
        Ok(info)
    }

    /// Count `amount` against the type's supply. Returns the updated record
    /// without writing it; `INVALID_AMOUNT` if the cap would be exceeded.
    pub fn reserve_supply(&self, mut info: AssetInfo, amount: u64) -> EngineResult<AssetInfo> {
        let issued = info
            .issued
            .checked_add(amount)
            .filter(|&total| info.total_supply == 0 || total <= info.total_supply)
            .ok_or_else(|| {
                EngineError::InvalidAmount(format!(
                    "issuing {amount} of {:?} exceeds its total supply of {} ({} already issued)",
                    info.asset_type_id, info.total_supply, info.issued
                ))
            })?;
        info.issued = issued;
        Ok(info)
    }

    // -- Minting and burning -------------------------------------------------

    /// `ALREADY_EXISTS` if `address` already names an asset.
    pub fn ensure_address_free<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        address: &str,
    ) -> EngineResult<()> {
        if store.exists::<Asset>(&[address])? {
            return Err(EngineError::AlreadyExists {
                entity: "asset",
                key: address.to_string(),
            });
        }
        Ok(())
    }

    /// Create an unspent asset under `pool` and its sealed index entry.
    pub fn mint<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        pool: &AssetPool,
        binding: &VerifiedBinding,
        value: u64,
    ) -> EngineResult<MintedAsset> {
        if binding.pool_id() != pool.pool_id {
            return Err(EngineError::validation(format!(
                "binding for pool {:?} used to mint into {:?}",
                binding.pool_id(),
                pool.pool_id
            )));
        }

        let pool_key = parse_encryption_key(&pool.public_key)?;
        let encrypted_address = seal_for_key(
            &pool_key,
            binding.address().as_bytes(),
            self.config.max_sealed_plaintext,
        )?;

        let asset = Asset {
            address: binding.address().to_string(),
            value,
            asset_type_id: binding.asset_type_id().to_string(),
            spent: false,
            sign: binding.sign().to_string(),
            minter: binding.minter().to_string(),
            index_id: encrypted_address.clone(),
        };
        store.insert_new(&asset)?;

        let index = AssetAddressIndex {
            pool_id: pool.pool_id.clone(),
            encrypted_address,
            asset_type_id: asset.asset_type_id.clone(),
            spent: false,
        };
        store.insert_new(&index)?;

        trace!(pool_id = %pool.pool_id, value, "asset minted");
        Ok(MintedAsset {
            address: asset.address,
            pool_id: index.pool_id,
            index_id: index.encrypted_address,
            value,
        })
    }

    /// Mark a candidate's asset and index entry spent. Returns `false` if
    /// both were already spent (re-burning is a no-op).
    pub fn burn<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        candidate: &Candidate,
    ) -> EngineResult<bool> {
        let mut changed = false;

        let mut asset = store.get::<Asset>(&[&candidate.asset.address])?;
        if !asset.spent {
            asset.spent = true;
            store.put(&asset)?;
            changed = true;
        }

        let mut index = store.get::<AssetAddressIndex>(&[
            &candidate.index.pool_id,
            &candidate.index.encrypted_address,
        ])?;
        if !index.spent {
            index.spent = true;
            store.put(&index)?;
            changed = true;
        }

        Ok(changed)
    }

    // -- Candidates, balance, selection ---------------------------------------

    /// Resolve candidate references to asset/index pairs under `pool_id`.
    ///
    /// Unknown addresses or index entries are `NOT_FOUND`. Duplicates,
    /// oversized lists, and an `indexId` that is not the one recorded on the
    /// asset are `VALIDATION_ERROR`.
    pub fn load_candidates<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        pool_id: &str,
        refs: &[CandidateRef],
    ) -> EngineResult<Vec<Candidate>> {
        if refs.len() > self.config.max_candidates {
            return Err(EngineError::validation(format!(
                "{} candidate addresses exceed the limit of {}",
                refs.len(),
                self.config.max_candidates
            )));
        }

        let mut seen = HashSet::with_capacity(refs.len());
        let mut seen_index = HashSet::with_capacity(refs.len());
        let mut candidates = Vec::with_capacity(refs.len());
        for r in refs {
            if r.address.trim().is_empty() || r.index_id.trim().is_empty() {
                return Err(EngineError::validation("candidate with empty address or indexId"));
            }
            if !seen.insert(r.address.as_str()) {
                return Err(EngineError::validation(format!(
                    "candidate address {:?} listed more than once",
                    r.address
                )));
            }
            if !seen_index.insert(r.index_id.as_str()) {
                return Err(EngineError::validation(format!(
                    "indexId of candidate {:?} is listed more than once",
                    r.address
                )));
            }
            let asset = store.get::<Asset>(&[&r.address])?;
            let index = store.get::<AssetAddressIndex>(&[pool_id, &r.index_id])?;
            if asset.index_id != index.encrypted_address {
                return Err(EngineError::validation(format!(
                    "indexId does not belong to candidate {:?}",
                    r.address
                )));
            }
            candidates.push(Candidate { asset, index });
        }
        Ok(candidates)
    }

    /// Keep only the candidates [`evaluate`] accepts.
    pub fn filter_eligible<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        pool_id: &str,
        asset_type_id: &str,
        candidates: Vec<Candidate>,
    ) -> EngineResult<Vec<Candidate>> {
        let mut minter_keys: HashMap<String, Option<VerifyingKey>> = HashMap::new();
        let mut eligible = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let minter = candidate.asset.minter.clone();
            if !minter_keys.contains_key(&minter) {
                let key = store
                    .find::<Organization>(&[&minter])?
                    .and_then(|org| parse_verifying_key(&org.sign_public_key).ok());
                minter_keys.insert(minter.clone(), key);
            }
            let key = minter_keys.get(&minter).and_then(Option::as_ref);

            match evaluate(&candidate, pool_id, asset_type_id, key) {
                Ok(()) => eligible.push(candidate),
                Err(reason) => {
                    debug!(pool_id, %reason, "candidate skipped");
                }
            }
        }
        Ok(eligible)
    }

    /// Sum of eligible candidate values.
    pub fn balance<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        pool_id: &str,
        asset_type_id: &str,
        refs: &[CandidateRef],
    ) -> EngineResult<u128> {
        let candidates = self.load_candidates(store, pool_id, refs)?;
        let eligible = self.filter_eligible(store, pool_id, asset_type_id, candidates)?;
        Ok(eligible.iter().map(|c| u128::from(c.asset.value)).sum())
    }

    /// Choose which eligible candidates fund `amount`.
    pub fn plan(&self, eligible: &[Candidate], amount: u64) -> EngineResult<SelectionPlan> {
        let inputs: Vec<(&str, u64)> = eligible
            .iter()
            .map(|c| (c.asset.address.as_str(), c.asset.value))
            .collect();
        plan_selection(&inputs, amount).map_err(|shortfall| EngineError::InsufficientBalance {
            available: shortfall.available,
            requested: shortfall.requested,
        })
    }

    /// Apply a funded transfer: mint change, mint the output, burn inputs.
    pub fn apply_transfer<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        plan: &TransferPlan,
    ) -> EngineResult<TransferOutcome> {
        let change = if plan.change > 0 {
            Some(self.mint(store, &plan.source, &plan.change_output, plan.change)?)
        } else {
            None
        };
        let output = self.mint(store, &plan.destination, &plan.output, plan.amount)?;

        let mut burned = Vec::with_capacity(plan.inputs.len());
        for input in &plan.inputs {
            self.burn(store, input)?;
            burned.push(input.asset.address.clone());
        }

        debug!(
            from = %plan.source.pool_id,
            to = %plan.destination.pool_id,
            inputs = burned.len(),
            change = plan.change,
            "transfer applied"
        );
        Ok(TransferOutcome {
            burned,
            output,
            change,
        })
    }
}
