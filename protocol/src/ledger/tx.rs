//! Staged, optimistic ledger transactions.

use std::collections::BTreeMap;

use tracing::debug;

use super::{ChangeSet, LedgerBackend, LedgerResult, StateStore};

/// One invocation's view of a [`LedgerBackend`].
///
/// Reads go to the staged write set first (read-your-writes), then to the
/// backend, recording the version seen. Writes are buffered until
/// [`commit`](Self::commit). Dropping a `LedgerTx` discards it.
pub struct LedgerTx<'b, B: LedgerBackend + ?Sized> {
    backend: &'b B,
    reads: BTreeMap<String, u64>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'b, B: LedgerBackend + ?Sized> LedgerTx<'b, B> {
    pub fn begin(backend: &'b B) -> Self {
        Self {
            backend,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Number of staged writes.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Hand the read and write sets to the backend. Read-only transactions
    /// commit nothing and always succeed.
    pub fn commit(self) -> LedgerResult<Option<u64>> {
        let changes = ChangeSet {
            reads: self.reads,
            writes: self.writes,
        };
        if changes.is_read_only() {
            return Ok(None);
        }
        let writes = changes.writes.len();
        let sequence = self.backend.commit(changes)?;
        debug!(sequence, writes, "ledger transaction committed");
        Ok(Some(sequence))
    }

    /// Remember the first version observed for `key`. Later reads of the
    /// same key must not overwrite it, or a conflict could be masked.
    fn record_read(&mut self, key: &str, version: u64) {
        self.reads.entry(key.to_string()).or_insert(version);
    }
}

impl<B: LedgerBackend + ?Sized> StateStore for LedgerTx<'_, B> {
    fn get_state(&mut self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(staged) = self.writes.get(key) {
            return Ok(staged.clone());
        }
        let current = self.backend.read(key)?;
        self.record_read(key, current.as_ref().map_or(0, |v| v.version));
        Ok(current.map(|v| v.value))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> LedgerResult<()> {
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn range_query(&mut self, prefix: &str) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        let mut merged: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (key, versioned) in self.backend.scan_prefix(prefix)? {
            self.record_read(&key, versioned.version);
            merged.insert(key, versioned.value);
        }
        for (key, staged) in self.writes.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match staged {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
