//! # Entity Store
//!
//! Typed persistence on top of a [`StateStore`]. Callers deal in
//! [`Entity`] values; this module turns them into composite keys (object
//! type from the [`Schema`], parts from [`Entity::key_parts`]) and JSON
//! bytes.
//!
//! Lookups come in two flavours:
//!
//! - [`EntityStore::get`]: the record must exist; absence is `NOT_FOUND`.
//! - [`EntityStore::find`]: absence is a normal `None`.
//!
//! [`EntityStore::insert_new`] refuses to overwrite, which is how every
//! create-once record (organizations, pools, assets, logs) gets its
//! `ALREADY_EXISTS` check. The protocol never deletes.

pub mod entities;

use tracing::trace;

use crate::config::Schema;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{CompositeKey, StateStore};

pub use entities::{
    Asset, AssetAddressIndex, AssetInfo, AssetPool, ChainLog, Entity, LogAddress, OrgIdentity,
    OrgPrivateLog, Organization, SealedLog, TxKind,
};

/// Typed access to the ledger for one invocation.
pub struct EntityStore<'a, S: StateStore + ?Sized> {
    state: &'a mut S,
    schema: &'a Schema,
}

impl<'a, S: StateStore + ?Sized> EntityStore<'a, S> {
    pub fn new(state: &'a mut S, schema: &'a Schema) -> Self {
        Self { state, schema }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    fn key_for<E: Entity>(&self, parts: &[&str]) -> EngineResult<String> {
        Ok(CompositeKey::new(self.schema.object_type(E::KIND), parts)?.encode())
    }

    /// Fetch a record, or `None` if absent.
    pub fn find<E: Entity>(&mut self, parts: &[&str]) -> EngineResult<Option<E>> {
        let key = self.key_for::<E>(parts)?;
        match self.state.get_state(&key)? {
            Some(bytes) => decode::<E>(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch a record that must exist.
    pub fn get<E: Entity>(&mut self, parts: &[&str]) -> EngineResult<E> {
        self.find::<E>(parts)?.ok_or_else(|| EngineError::NotFound {
            entity: E::NAME,
            key: parts.join("/"),
        })
    }

    pub fn exists<E: Entity>(&mut self, parts: &[&str]) -> EngineResult<bool> {
        let key = self.key_for::<E>(parts)?;
        Ok(self.state.get_state(&key)?.is_some())
    }

    /// Write a record, replacing any previous value at its key.
    pub fn put<E: Entity>(&mut self, entity: &E) -> EngineResult<()> {
        let key = self.key_for::<E>(&entity.key_parts())?;
        let bytes = serde_json::to_vec(entity).map_err(|e| EngineError::CorruptRecord {
            entity: E::NAME,
            reason: e.to_string(),
        })?;
        trace!(entity = E::NAME, "staging record");
        self.state.put_state(&key, bytes)?;
        Ok(())
    }

    /// Write a record that must not exist yet.
    pub fn insert_new<E: Entity>(&mut self, entity: &E) -> EngineResult<()> {
        let parts = entity.key_parts();
        if self.exists::<E>(&parts)? {
            return Err(EngineError::AlreadyExists {
                entity: E::NAME,
                key: parts.join("/"),
            });
        }
        self.put(entity)
    }

    /// Every record whose key extends the partial key `parts`, in key order.
    pub fn scan<E: Entity>(&mut self, parts: &[&str]) -> EngineResult<Vec<E>> {
        let prefix = self.key_for::<E>(parts)?;
        self.state
            .range_query(&prefix)?
            .iter()
            .map(|(_, bytes)| decode::<E>(bytes))
            .collect()
    }
}

fn decode<E: Entity>(bytes: &[u8]) -> EngineResult<E> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::CorruptRecord {
        entity: E::NAME,
        reason: e.to_string(),
    })
}
