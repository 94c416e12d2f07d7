//! Persisted record types.
//!
//! Flat camelCase JSON, one canonical shape per entity. Optional fields are
//! omitted when empty so records written by different clients compare equal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EntityKind;

/// A record the [`EntityStore`](super::EntityStore) can persist.
pub trait Entity: Serialize + serde::de::DeserializeOwned {
    const KIND: EntityKind;
    /// Name used in `NOT_FOUND` / `ALREADY_EXISTS` messages.
    const NAME: &'static str;

    /// The composite-key parts (after the object type) this record lives at.
    fn key_parts(&self) -> Vec<&str>;
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// A registered participant. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub org_id: String,
    /// X25519 key, PEM. Private logs are sealed to it.
    pub public_key: String,
    /// Ed25519 key, PEM. Verifies requests and asset bindings.
    pub sign_public_key: String,
    /// Fingerprint of the credential that owns this organization.
    pub network_identity: String,
}

impl Entity for Organization {
    const KIND: EntityKind = EntityKind::Organization;
    const NAME: &'static str = "organization";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.org_id.as_str()]
    }
}

/// Reverse index: credential fingerprint to organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgIdentity {
    pub network_identity: String,
    pub org_id: String,
}

impl Entity for OrgIdentity {
    const KIND: EntityKind = EntityKind::OrgIdentity;
    const NAME: &'static str = "orgIdentity";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.network_identity.as_str()]
    }
}

// ---------------------------------------------------------------------------
// Pools and assets
// ---------------------------------------------------------------------------

/// A registered asset type. Assets can only be issued under a registered
/// type, and `issued` never passes a non-zero `total_supply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub asset_type_id: String,
    pub asset_name: String,
    pub asset_symbol: String,
    #[serde(default)]
    pub decimals: u8,
    /// Issuance cap in the smallest unit. 0 means uncapped.
    #[serde(default)]
    pub total_supply: u64,
    /// Running total of everything issued under this type.
    #[serde(default)]
    pub issued: u64,
    pub registered_by: String,
}

impl AssetInfo {
    /// Units still issuable, or `None` when uncapped.
    pub fn remaining(&self) -> Option<u64> {
        (self.total_supply > 0).then(|| self.total_supply.saturating_sub(self.issued))
    }
}

impl Entity for AssetInfo {
    const KIND: EntityKind = EntityKind::AssetInfo;
    const NAME: &'static str = "assetInfo";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.asset_type_id.as_str()]
    }
}

/// An account that holds assets. `attach_hash` binds it to `org_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPool {
    pub pool_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pool_type: String,
    /// X25519 key, PEM. Asset addresses are sealed to it.
    pub public_key: String,
    pub org_id: String,
    pub attach_hash: String,
}

impl Entity for AssetPool {
    const KIND: EntityKind = EntityKind::AssetPool;
    const NAME: &'static str = "assetPool";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.pool_id.as_str()]
    }
}

/// One coin. `value` never changes; `spent` only goes false -> true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub address: String,
    pub value: u64,
    pub asset_type_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub spent: bool,
    /// Binding signature over (pool, address, asset type) by `minter`.
    pub sign: String,
    pub minter: String,
    /// Key of this asset's pool index entry (its sealed address). Spending
    /// the asset must name exactly this entry.
    pub index_id: String,
}

impl Entity for Asset {
    const KIND: EntityKind = EntityKind::Asset;
    const NAME: &'static str = "asset";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.address.as_str()]
    }
}

/// Confidential pool index entry, keyed `(poolId, encryptedAddress)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAddressIndex {
    pub pool_id: String,
    pub encrypted_address: String,
    pub asset_type_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub spent: bool,
}

impl Entity for AssetAddressIndex {
    const KIND: EntityKind = EntityKind::AssetAddressIndex;
    const NAME: &'static str = "assetAddr";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.pool_id.as_str(), self.encrypted_address.as_str()]
    }
}

// ---------------------------------------------------------------------------
// Audit logs
// ---------------------------------------------------------------------------

/// Kind of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    /// Private log of the paying side of a transfer.
    Outcome,
    /// Private log of the receiving side of a transfer.
    Income,
    Issue,
    Transfer,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Outcome => "OUTCOME",
            TxKind::Income => "INCOME",
            TxKind::Issue => "ISSUE",
            TxKind::Transfer => "TRANSFER",
        }
    }
}

/// Plaintext of a private log. Only ever stored sealed, inside a
/// [`SealedLog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgPrivateLog {
    pub log_id: String,
    pub tx_id: String,
    pub kind: TxKind,
    pub org_id: String,
    pub from_pool: String,
    pub to_pool: String,
    pub asset_type_id: String,
    pub value: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_info: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mod_user: String,
    pub timestamp: DateTime<Utc>,
}

/// A private log sealed to its organization's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedLog {
    pub log_id: String,
    pub ciphertext: String,
}

impl Entity for SealedLog {
    const KIND: EntityKind = EntityKind::OrgPrivateLog;
    const NAME: &'static str = "orgPrivateLog";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.log_id.as_str()]
    }
}

/// Lets an organization find its private logs: the log id, sealed to the
/// organization key, keyed under the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAddress {
    pub org_id: String,
    pub encrypted_log_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Entity for LogAddress {
    const KIND: EntityKind = EntityKind::LogAddress;
    const NAME: &'static str = "logAddr";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.org_id.as_str(), self.encrypted_log_id.as_str()]
    }
}

/// Public, per-transaction audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLog {
    pub log_id: String,
    pub tx_id: String,
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_pool: String,
    pub to_pool: String,
    pub asset_type_id: String,
    pub value: u64,
    pub timestamp: DateTime<Utc>,
}

impl Entity for ChainLog {
    const KIND: EntityKind = EntityKind::ChainLog;
    const NAME: &'static str = "chainLog";

    fn key_parts(&self) -> Vec<&str> {
        vec![self.tx_id.as_str()]
    }
}
