//! Audit logs.
//!
//! Two kinds of record, both append-only:
//!
//! - **Private logs** (`OUTCOME` for the paying organization, `INCOME` for
//!   the receiving one). Serialized, sealed to the organization's X25519
//!   key, and stored as a [`SealedLog`]. A [`LogAddress`] entry (the log id,
//!   itself sealed, keyed under the organization) lets the organization find
//!   them without anyone else learning which logs are whose.
//! - **Chain logs**, one public [`ChainLog`] per issue or transfer.
//!
//! Log ids are `prefix + txId + "_" + kind`, so one transaction can never
//! produce two logs with the same id, and replaying a transaction id is
//! caught as `ALREADY_EXISTS`.

use tracing::debug;
use x25519_dalek::PublicKey as X25519PublicKey;

use crate::config::EngineConfig;
use crate::crypto::{parse_encryption_key, seal_for_key};
use crate::error::{EngineError, EngineResult};
use crate::ledger::StateStore;
use crate::store::{
    ChainLog, EntityStore, LogAddress, OrgPrivateLog, Organization, SealedLog, TxKind,
};

/// An organization whose key has already been parsed, so that writing its
/// log cannot fail on a bad key after the ledger has been mutated.
#[derive(Debug, Clone)]
pub struct LogRecipient {
    org_id: String,
    key: X25519PublicKey,
}

impl LogRecipient {
    pub fn for_org(org: &Organization) -> EngineResult<Self> {
        Ok(Self {
            org_id: org.org_id.clone(),
            key: parse_encryption_key(&org.public_key)?,
        })
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }
}

/// A private log and its index entry, sealed and ready to store.
#[derive(Debug, Clone)]
pub struct SealedPrivateLog {
    log: SealedLog,
    address: LogAddress,
}

impl SealedPrivateLog {
    pub fn log_id(&self) -> &str {
        &self.log.log_id
    }
}

pub struct AuditTrail<'c> {
    config: &'c EngineConfig,
}

impl<'c> AuditTrail<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    pub fn private_log_id(&self, tx_id: &str, kind: TxKind) -> String {
        format!(
            "{}{}_{}",
            self.config.schema.account_log_prefix,
            tx_id,
            kind.as_str()
        )
    }

    pub fn chain_log_id(&self, tx_id: &str) -> String {
        format!("{}{}", self.config.schema.chain_log_prefix, tx_id)
    }

    /// Seal `log` for `recipient` without writing anything. Sealing is the
    /// only step of log writing that can fail on input, so transfers seal
    /// their logs before the first mutation.
    pub fn seal_private_log(
        &self,
        recipient: &LogRecipient,
        log: &OrgPrivateLog,
    ) -> EngineResult<SealedPrivateLog> {
        let plaintext = serde_json::to_vec(log).map_err(|e| EngineError::CorruptRecord {
            entity: "orgPrivateLog",
            reason: e.to_string(),
        })?;
        let limit = self.config.max_sealed_plaintext;

        Ok(SealedPrivateLog {
            log: SealedLog {
                log_id: log.log_id.clone(),
                ciphertext: seal_for_key(&recipient.key, &plaintext, limit)?,
            },
            address: LogAddress {
                org_id: recipient.org_id.clone(),
                encrypted_log_id: seal_for_key(&recipient.key, log.log_id.as_bytes(), limit)?,
                timestamp: log.timestamp,
            },
        })
    }

    /// Store a sealed log and its index entry. Returns the log id.
    pub fn write_private_log<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        sealed: SealedPrivateLog,
    ) -> EngineResult<String> {
        store.insert_new(&sealed.log)?;
        store.insert_new(&sealed.address)?;
        debug!(org_id = %sealed.address.org_id, "private log written");
        Ok(sealed.log.log_id)
    }

    pub fn write_chain_log<S: StateStore + ?Sized>(
        &self,
        store: &mut EntityStore<'_, S>,
        log: &ChainLog,
    ) -> EngineResult<()> {
        store.insert_new(log)?;
        debug!(tx_id = %log.tx_id, kind = log.kind.as_str(), "chain log written");
        Ok(())
    }
}
