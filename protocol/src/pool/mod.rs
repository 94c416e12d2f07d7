//! # Asset Pool Engine
//!
//! Pools hold assets the way a UTXO wallet holds coins: a balance is the sum
//! of unspent asset records, and moving value means burning some records and
//! minting new ones (one for the recipient, one for the change).
//!
//! ```text
//! binding.rs   - binding signatures: which pool an asset may be spent from
//! selection.rs - the eligibility predicate and the pure selection planner
//! engine.rs    - PoolEngine: init, mint, burn, balance, plan, apply
//! ```
//!
//! ## Confidentiality
//!
//! A pool's assets are found through its index, keyed
//! `(poolId, sealed(address))`. The engine seals each new address to the
//! pool's public key; only the pool's key holder can open the index and
//! learn which addresses it owns. Because sealing is randomized, the engine
//! can't look an address up in the index by re-sealing it. Callers name the
//! assets they want to spend as [`CandidateRef`]s, pairing each plaintext
//! address with the index key they decrypted it from. Every asset records
//! its own index key at mint, so a candidate that pairs an address with some
//! other asset's entry is rejected.

pub mod binding;
pub mod engine;
pub mod selection;

use serde::{Deserialize, Serialize};

pub use binding::{binding_message, sign_binding, VerifiedBinding};
pub use engine::{attach_hash, MintedAsset, PoolEngine, TransferOutcome, TransferPlan};
pub use selection::{evaluate, plan_selection, Candidate, Ineligible, SelectionPlan, Shortfall};

/// A caller's claim that `address` sits in the source pool's index under
/// `index_id` (the sealed address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRef {
    pub address: String,
    pub index_id: String,
}
