//! # Engine Configuration & Constants
//!
//! Every magic number in Tessera lives here, together with the two runtime
//! configuration types the engine is constructed with:
//!
//! - [`Schema`]: the registry of object-type tags, log prefixes, and
//!   transient-map keys. Every ledger key the engine writes starts with one of
//!   these tags, so two entity kinds can never collide in the keyspace.
//! - [`EngineConfig`]: limits and policy knobs (candidate fan-in, log-info
//!   length, admin allow-list). Deserializable so hosts can load it from a
//!   file; every field has a default.
//!
//! Changing a schema tag after data has been written orphans every record
//! under the old tag. Choose once.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Organizations sign with Ed25519. Deterministic, 64-byte signatures.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Pools and organizations receive sealed data under X25519 keys.
pub const KEY_EXCHANGE_ALGORITHM: &str = "X25519";

/// X25519 public key length in bytes.
pub const ENCRYPTION_KEY_LENGTH: usize = 32;

/// Symmetric cipher used inside a sealed box.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// AES-256 key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes (96 bits, the only size worth using).
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// BLAKE3 `derive_key` context for sealed-box key derivation. Globally
/// unique and hardcoded, as BLAKE3 requires.
pub const SEALED_BOX_KDF_CONTEXT: &str = "tessera 2026-01 sealed-box aes-256-gcm key";

/// Domain tag prepended to every asset binding message so a binding
/// signature can never be replayed as a request signature (or vice versa).
pub const BINDING_DOMAIN: &str = "tessera/asset-binding/v1";

/// Separator between hashed and signed parts, and between composite key
/// parts. Identifiers may not contain it.
pub const PART_SEPARATOR: char = '\u{0}';

// ---------------------------------------------------------------------------
// Default Limits
// ---------------------------------------------------------------------------

/// Maximum number of candidate source addresses a single transfer may
/// reference. Bounds the work (and signature checks) of one invocation.
pub const DEFAULT_MAX_CANDIDATES: usize = 256;

/// Maximum length of the free-text `logInfo` field, in bytes.
pub const DEFAULT_MAX_LOG_INFO_LEN: usize = 512;

/// Largest plaintext a sealed box accepts. Asset addresses and log records
/// are small; anything larger than this is a caller bug.
pub const DEFAULT_MAX_SEALED_PLAINTEXT: usize = 4096;

/// Most decimal places an asset type may declare.
pub const MAX_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Entity Kinds & Schema Registry
// ---------------------------------------------------------------------------

/// Every kind of record the engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organization,
    OrgIdentity,
    AssetInfo,
    AssetPool,
    Asset,
    AssetAddressIndex,
    OrgPrivateLog,
    LogAddress,
    ChainLog,
}

/// Object-type tags, log prefixes, and transient keys.
///
/// Passed into the engine rather than hardcoded at call sites, so a host
/// that already has data under different tags can keep using them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schema {
    pub organization: String,
    pub org_identity: String,
    pub asset_info: String,
    pub asset_pool: String,
    pub asset: String,
    pub asset_address: String,
    pub org_private_log: String,
    pub log_address: String,
    pub chain_log: String,
    /// Prefix of private (per-organization) log identifiers.
    pub account_log_prefix: String,
    /// Prefix of public chain log identifiers.
    pub chain_log_prefix: String,
    /// Transient-map key carrying the transfer's candidate source addresses.
    pub candidates_key: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            organization: "organization".into(),
            org_identity: "orgIdentity".into(),
            asset_info: "assetInfo".into(),
            asset_pool: "assetPool".into(),
            asset: "asset".into(),
            asset_address: "assetAddr".into(),
            org_private_log: "orgPrivateLog".into(),
            log_address: "logAddr".into(),
            chain_log: "chainLog".into(),
            account_log_prefix: "Log_Account_".into(),
            chain_log_prefix: "Log_Chain_".into(),
            candidates_key: "assetAddrs".into(),
        }
    }
}

impl Schema {
    /// The object-type tag for an entity kind.
    pub fn object_type(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Organization => &self.organization,
            EntityKind::OrgIdentity => &self.org_identity,
            EntityKind::AssetInfo => &self.asset_info,
            EntityKind::AssetPool => &self.asset_pool,
            EntityKind::Asset => &self.asset,
            EntityKind::AssetAddressIndex => &self.asset_address,
            EntityKind::OrgPrivateLog => &self.org_private_log,
            EntityKind::LogAddress => &self.log_address,
            EntityKind::ChainLog => &self.chain_log,
        }
    }

    fn tags(&self) -> [&str; 9] {
        [
            &self.organization,
            &self.org_identity,
            &self.asset_info,
            &self.asset_pool,
            &self.asset,
            &self.asset_address,
            &self.org_private_log,
            &self.log_address,
            &self.chain_log,
        ]
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Errors raised by [`EngineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("schema tag for an entity kind is empty")]
    EmptyTag,

    #[error("schema tag {0:?} is used by more than one entity kind")]
    DuplicateTag(String),

    #[error("schema tag {0:?} contains the key separator")]
    SeparatorInTag(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Runtime configuration of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub schema: Schema,
    /// Upper bound on candidate source addresses per transfer.
    pub max_candidates: usize,
    /// Upper bound on the `logInfo` request field, in bytes.
    pub max_log_info_len: usize,
    /// Upper bound on a sealed-box plaintext, in bytes.
    pub max_sealed_plaintext: usize,
    /// Credential fingerprints allowed to register organizations. Empty
    /// means registration is open to any resolvable caller credential.
    pub admin_identities: Vec<String>,
    /// Accept `amount == 0` on issue. Off by default.
    pub allow_zero_issue: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_log_info_len: DEFAULT_MAX_LOG_INFO_LEN,
            max_sealed_plaintext: DEFAULT_MAX_SEALED_PLAINTEXT,
            admin_identities: Vec::new(),
            allow_zero_issue: false,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tags = self.schema.tags();
        for (i, tag) in tags.iter().enumerate() {
            if tag.is_empty() {
                return Err(ConfigError::EmptyTag);
            }
            if tag.contains(PART_SEPARATOR) {
                return Err(ConfigError::SeparatorInTag(tag.to_string()));
            }
            if tags[..i].contains(tag) {
                return Err(ConfigError::DuplicateTag(tag.to_string()));
            }
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::ZeroLimit("maxCandidates"));
        }
        if self.max_sealed_plaintext == 0 {
            return Err(ConfigError::ZeroLimit("maxSealedPlaintext"));
        }
        Ok(())
    }

    /// Whether `fingerprint` may register organizations.
    pub fn is_admin(&self, fingerprint: &str) -> bool {
        self.admin_identities.is_empty() || self.admin_identities.iter().any(|a| a == fingerprint)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
