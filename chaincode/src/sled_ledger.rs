//! # SledLedger: Durable Ledger Backend
//!
//! A [`LedgerBackend`] on sled's embedded key-value store, for hosts that
//! want Tessera state to survive a restart.
//!
//! ## Tree Layout
//!
//! | Tree    | Key                     | Value                 |
//! |---------|-------------------------|-----------------------|
//! | `state` | composite key (UTF-8)   | `bincode(Versioned)`  |
//! | `state` | `META_SEQUENCE`         | sequence (8B BE)      |
//!
//! The sequence counter lives in the same tree as the data so that one
//! `Batch` carries both. Its key starts with `0xFF`, which never occurs in
//! UTF-8, so it cannot collide with a composite key. Prefix scans skip it.
//!
//! ## Atomicity
//!
//! A commit checks every read version, then writes all staged values and the
//! new sequence number in a single atomic `Batch`. Commits are serialized by
//! a process-wide lock; reads never take it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use sled::{Batch, Db, Tree};
use tracing::debug;

use tessera_protocol::ledger::{ChangeSet, LedgerBackend, LedgerError, LedgerResult, Versioned};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised while opening a [`SledLedger`].
#[derive(Debug, thiserror::Error)]
pub enum SledLedgerError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("corrupt sequence counter")]
    CorruptSequence,
}

pub type SledResult<T> = Result<T, SledLedgerError>;

const META_SEQUENCE: &[u8] = b"\xff\xffsequence";

fn backend_err(err: sled::Error) -> LedgerError {
    LedgerError::Backend(err.to_string())
}

fn decode(key: &str, bytes: &[u8]) -> LedgerResult<Versioned> {
    bincode::deserialize(bytes)
        .map_err(|e| LedgerError::Serialization(format!("{key:?}: {e}")))
}

fn decode_sequence(bytes: &[u8]) -> Option<u64> {
    bytes.try_into().ok().map(u64::from_be_bytes)
}

// ---------------------------------------------------------------------------
// SledLedger
// ---------------------------------------------------------------------------

/// Durable ledger backend. Cheap to clone; clones share the database and
/// the commit lock.
#[derive(Debug, Clone)]
pub struct SledLedger {
    db: Db,
    state: Tree,
    commit_lock: Arc<Mutex<()>>,
}

impl SledLedger {
    /// Open or create a ledger at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> SledResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// A ledger that is deleted when the last clone is dropped.
    pub fn open_temporary() -> SledResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> SledResult<Self> {
        let state = db.open_tree("state")?;
        let ledger = Self {
            db,
            state,
            commit_lock: Arc::new(Mutex::new(())),
        };
        // Refuse to start on a counter we can't read.
        if let Some(raw) = ledger.state.get(META_SEQUENCE)? {
            decode_sequence(&raw).ok_or(SledLedgerError::CorruptSequence)?;
        }
        Ok(ledger)
    }

    /// Sequence number of the last commit; 0 for a fresh ledger.
    pub fn sequence(&self) -> LedgerResult<u64> {
        match self.state.get(META_SEQUENCE).map_err(backend_err)? {
            Some(raw) => decode_sequence(&raw)
                .ok_or_else(|| LedgerError::Serialization("sequence counter".into())),
            None => Ok(0),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        let meta = usize::from(matches!(self.state.contains_key(META_SEQUENCE), Ok(true)));
        self.state.len().saturating_sub(meta)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerBackend for SledLedger {
    fn read(&self, key: &str) -> LedgerResult<Option<Versioned>> {
        match self.state.get(key.as_bytes()).map_err(backend_err)? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn scan_prefix(&self, prefix: &str) -> LedgerResult<Vec<(String, Versioned)>> {
        let mut entries = Vec::new();
        for item in self.state.scan_prefix(prefix.as_bytes()) {
            let (raw_key, bytes) = item.map_err(backend_err)?;
            if raw_key.as_ref() == META_SEQUENCE {
                continue;
            }
            let key = String::from_utf8(raw_key.to_vec())
                .map_err(|_| LedgerError::InvalidKey("non UTF-8 key in state tree".into()))?;
            let value = decode(&key, &bytes)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    fn commit(&self, changes: ChangeSet) -> LedgerResult<u64> {
        let _guard = self.commit_lock.lock();

        for (key, seen) in &changes.reads {
            let current = self.read(key)?.map_or(0, |v| v.version);
            if current != *seen {
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }

        let sequence = self.sequence()? + 1;
        let writes = changes.writes.len();
        let mut batch = Batch::default();
        for (key, write) in changes.writes {
            match write {
                Some(value) => {
                    let record = bincode::serialize(&Versioned { version: sequence, value })
                        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                    batch.insert(key.as_bytes(), record);
                }
                None => batch.remove(key.as_bytes()),
            }
        }
        batch.insert(META_SEQUENCE, sequence.to_be_bytes().to_vec());

        self.state.apply_batch(batch).map_err(backend_err)?;
        self.db.flush().map_err(backend_err)?;
        debug!(sequence, writes, "sled commit applied");
        Ok(sequence)
    }
}
