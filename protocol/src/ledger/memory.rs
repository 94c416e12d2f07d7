//! In-memory ledger backend.
//!
//! A `BTreeMap` behind a `parking_lot::RwLock`. Commits take the write lock,
//! validate read versions, and apply the whole change set under it, so a
//! commit is atomic with respect to every other reader and committer.
//! Used by the engine's own tests and by anything that wants to run the
//! protocol without a persistent host.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{ChangeSet, LedgerBackend, LedgerError, LedgerResult, Versioned};

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, Versioned>,
    sequence: u64,
}

/// Thread-safe in-memory [`LedgerBackend`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<MemoryState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence number of the last successful commit (0 before any).
    pub fn sequence(&self) -> u64 {
        self.state.read().sequence
    }

    /// Copy of every live entry. Tests use this to assert that a rejected
    /// request left the ledger byte-for-byte unchanged.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.state
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }
}

impl LedgerBackend for MemoryLedger {
    fn read(&self, key: &str) -> LedgerResult<Option<Versioned>> {
        Ok(self.state.read().entries.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &str) -> LedgerResult<Vec<(String, Versioned)>> {
        let state = self.state.read();
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, changes: ChangeSet) -> LedgerResult<u64> {
        let mut state = self.state.write();

        for (key, seen) in &changes.reads {
            let current = state.entries.get(key).map_or(0, |v| v.version);
            if current != *seen {
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }

        let sequence = state.sequence + 1;
        for (key, write) in changes.writes {
            match write {
                Some(value) => {
                    state.entries.insert(key, Versioned { version: sequence, value });
                }
                None => {
                    state.entries.remove(&key);
                }
            }
        }
        state.sequence = sequence;
        Ok(sequence)
    }
}
