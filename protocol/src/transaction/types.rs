//! Request, receipt, and lifecycle types.
//!
//! Requests are ephemeral: they are validated, acted on, and dropped. Only
//! their effects (entities and logs) are persisted. Amounts arrive as `i64`
//! so that a negative amount is an `INVALID_AMOUNT` rejection rather than a
//! JSON parse failure.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::signing::Signable;
use crate::pool::{MintedAsset, TransferOutcome};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Register an organization. Self-signed with the key it registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    pub org_id: String,
    /// X25519 key, PEM.
    pub public_key: String,
    /// Ed25519 key, PEM. Also the key this request is signed with.
    pub sign_public_key: String,
    /// Defaults to the caller's credential fingerprint when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_identity: String,
}

impl Signable for OrganizationRequest {
    fn signer(&self) -> &str {
        &self.org_id
    }
}

/// Create an asset pool owned by `org_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRequest {
    pub org_id: String,
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pool_type: String,
    /// X25519 key, PEM. Asset addresses in this pool are sealed to it.
    pub public_key: String,
}

impl Signable for PoolRequest {
    fn signer(&self) -> &str {
        &self.org_id
    }
}

/// Register an asset type. Issuing requires the type to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeRequest {
    pub org_id: String,
    pub asset_type_id: String,
    pub asset_name: String,
    pub asset_symbol: String,
    #[serde(default)]
    pub decimals: u8,
    /// Issuance cap; 0 means uncapped. Signed so a negative cap is an
    /// `INVALID_AMOUNT` rejection.
    #[serde(default)]
    pub total_supply: i64,
}

impl Signable for AssetTypeRequest {
    fn signer(&self) -> &str {
        &self.org_id
    }
}

/// Mint new value into one of the caller's pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub org_id: String,
    pub to_pool: String,
    pub asset_type_id: String,
    pub amount: i64,
    pub new_asset_addr: String,
    /// Binding signature over `(toPool, newAssetAddr, assetTypeId)`.
    pub new_asset_sign: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_info: String,
}

impl Signable for IssueRequest {
    fn signer(&self) -> &str {
        &self.org_id
    }
}

/// Move `amount` from one of the caller's pools to any pool.
///
/// `new_asset_addrs` is `[output, change]`; `new_asset_signs` holds their
/// binding signatures, for `to_pool` and `from_pool` respectively. Both are
/// required even when the transfer turns out to need no change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub org_id: String,
    pub from_pool: String,
    pub to_pool: String,
    pub asset_type_id: String,
    pub amount: i64,
    pub new_asset_addrs: Vec<String>,
    pub new_asset_signs: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_info: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mod_user: String,
}

impl Signable for TransferRequest {
    fn signer(&self) -> &str {
        &self.org_id
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where a request is in its lifecycle.
///
/// ```text
/// RECEIVED -> VALIDATED -> POOLS_RESOLVED -> APPLIED -> LOGGED -> DONE
///     \____________\______________\____________\_________\-> REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxPhase {
    Received,
    Validated,
    PoolsResolved,
    Applied,
    Logged,
    Done,
    Rejected,
}

impl TxPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxPhase::Done | TxPhase::Rejected)
    }

    /// The phase that legitimately follows this one on the happy path.
    pub fn next(self) -> Option<TxPhase> {
        match self {
            TxPhase::Received => Some(TxPhase::Validated),
            TxPhase::Validated => Some(TxPhase::PoolsResolved),
            TxPhase::PoolsResolved => Some(TxPhase::Applied),
            TxPhase::Applied => Some(TxPhase::Logged),
            TxPhase::Logged => Some(TxPhase::Done),
            TxPhase::Done | TxPhase::Rejected => None,
        }
    }
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxPhase::Received => "RECEIVED",
            TxPhase::Validated => "VALIDATED",
            TxPhase::PoolsResolved => "POOLS_RESOLVED",
            TxPhase::Applied => "APPLIED",
            TxPhase::Logged => "LOGGED",
            TxPhase::Done => "DONE",
            TxPhase::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReceipt {
    pub tx_id: String,
    pub asset: MintedAsset,
    pub chain_log_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_id: String,
    #[serde(flatten)]
    pub outcome: TransferOutcome,
    /// `[OUTCOME log id, INCOME log id]`.
    pub private_log_ids: Vec<String>,
    pub chain_log_id: String,
}
