//! # Ledger Interface
//!
//! The engine's only storage substrate is a versioned key/value ledger owned
//! by the host. This module is the seam between the two:
//!
//! ```text
//! key.rs     - CompositeKey: (objectType, [parts...]) <-> ledger key string
//! tx.rs      - LedgerTx: one invocation's staged writes + read versions
//! memory.rs  - MemoryLedger: in-process LedgerBackend for tests and tools
//! ```
//!
//! ## Two traits, two audiences
//!
//! - [`StateStore`] is what the engine writes through: get/put/delete and
//!   prefix range queries, scoped to a single invocation.
//! - [`LedgerBackend`] is what a host implements: versioned reads and an
//!   atomic, optimistic [`LedgerBackend::commit`] of a [`ChangeSet`].
//!
//! [`LedgerTx`] adapts the second into the first. Nothing the engine does is
//! visible to anyone until the host commits the transaction, and a rejected
//! request simply drops it: no partial writes, ever.
//!
//! ## Concurrency
//!
//! Every key carries a version (the commit sequence number that last wrote
//! it; 0 means absent). A transaction remembers the version of every key it
//! read, and commit fails with [`LedgerError::Conflict`] if any of them
//! moved. Two transfers racing to spend the same asset both read its record;
//! whichever commits second is refused.

pub mod key;
pub mod memory;
pub mod tx;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use key::CompositeKey;
pub use memory::MemoryLedger;
pub use tx::LedgerTx;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by the ledger layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger backend error: {0}")]
    Backend(String),

    #[error("commit conflict: {key:?} changed since it was read")]
    Conflict { key: String },

    #[error("invalid composite key: {0}")]
    InvalidKey(String),

    #[error("ledger serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Host-facing types
// ---------------------------------------------------------------------------

/// A stored value together with the commit sequence that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned {
    pub version: u64,
    pub value: Vec<u8>,
}

/// Everything one transaction wants to commit.
///
/// `reads` maps each key read to the version observed (0 = absent).
/// `writes` maps each key written to its new value, or `None` for a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub reads: BTreeMap<String, u64>,
    pub writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl ChangeSet {
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A versioned key/value store a host exposes to the engine.
pub trait LedgerBackend {
    /// Read one key.
    fn read(&self, key: &str) -> LedgerResult<Option<Versioned>>;

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> LedgerResult<Vec<(String, Versioned)>>;

    /// Atomically validate `changes.reads` and apply `changes.writes`.
    ///
    /// Returns the new commit sequence number. Must fail with
    /// [`LedgerError::Conflict`] without applying anything if any read
    /// version is stale.
    fn commit(&self, changes: ChangeSet) -> LedgerResult<u64>;
}

/// The engine's view of the ledger for one invocation.
///
/// Methods take `&mut self` because reads are recorded for conflict
/// detection.
pub trait StateStore {
    fn get_state(&mut self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    /// Present for completeness; the protocol itself never deletes.
    fn delete_state(&mut self, key: &str) -> LedgerResult<()>;

    /// All `(key, value)` pairs under `prefix`, staged writes included.
    fn range_query(&mut self, prefix: &str) -> LedgerResult<Vec<(String, Vec<u8>)>>;
}

// ---------------------------------------------------------------------------
// Invocation context
// ---------------------------------------------------------------------------

/// Per-invocation context handed over by the host: who is calling, under
/// which transaction id, when, and with which confidential side-channel
/// fields.
///
/// The engine reads the timestamp from here and never from the wall clock,
/// so replaying an invocation yields identical records.
#[derive(Debug, Clone)]
pub struct Invocation {
    tx_id: String,
    credential: Vec<u8>,
    timestamp: DateTime<Utc>,
    transient: HashMap<String, Vec<u8>>,
}

impl Invocation {
    /// A fresh invocation with a random transaction id, stamped now.
    pub fn new(credential: impl Into<Vec<u8>>) -> Self {
        Self {
            tx_id: uuid::Uuid::new_v4().simple().to_string(),
            credential: credential.into(),
            timestamp: Utc::now(),
            transient: HashMap::new(),
        }
    }

    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = tx_id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_transient(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.transient.insert(key.into(), value.into());
        self
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// The caller's raw credential (certificate bytes).
    pub fn credential(&self) -> &[u8] {
        &self.credential
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn transient(&self, key: &str) -> Option<&[u8]> {
        self.transient.get(key).map(Vec::as_slice)
    }
}
