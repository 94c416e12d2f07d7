//! Read-only operations.
//!
//! Queries never require a signature: everything they return is either
//! public (pools, chain logs, organizations) or sealed (index entries,
//! private logs), so reading it proves nothing and leaks nothing beyond
//! record counts.

use super::orchestrator::Orchestrator;
use super::validation::{candidates_from_transient, require};
use crate::error::EngineResult;
use crate::ledger::{Invocation, StateStore};
use crate::pool::PoolEngine;
use crate::store::{
    Asset, AssetAddressIndex, AssetInfo, AssetPool, ChainLog, EntityStore, LogAddress, Organization,
    SealedLog,
};

impl Orchestrator<'_> {
    fn store<'s, S: StateStore + ?Sized>(&'s self, state: &'s mut S) -> EntityStore<'s, S> {
        EntityStore::new(state, &self.config().schema)
    }

    pub fn query_asset<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        address: &str,
    ) -> EngineResult<Asset> {
        require("address", address)?;
        self.store(state).get::<Asset>(&[address])
    }

    /// Sealed private logs by id. Every id must exist.
    pub fn query_logs<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        log_ids: &[String],
    ) -> EngineResult<Vec<SealedLog>> {
        let mut store = self.store(state);
        log_ids
            .iter()
            .map(|id| {
                require("logId", id)?;
                store.get::<SealedLog>(&[id])
            })
            .collect()
    }

    pub fn query_organization<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        org_id: &str,
    ) -> EngineResult<Organization> {
        require("orgId", org_id)?;
        self.store(state).get::<Organization>(&[org_id])
    }

    /// A registered asset type, with its running issued total.
    pub fn query_asset_type<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        asset_type_id: &str,
    ) -> EngineResult<AssetInfo> {
        require("assetTypeId", asset_type_id)?;
        self.store(state).get::<AssetInfo>(&[asset_type_id])
    }

    pub fn query_pool<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        pool_id: &str,
    ) -> EngineResult<AssetPool> {
        require("poolId", pool_id)?;
        self.store(state).get::<AssetPool>(&[pool_id])
    }

    /// Every index entry of a pool, spent ones included. Only the pool key
    /// holder can tell which address each entry stands for.
    pub fn query_pool_index<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        pool_id: &str,
    ) -> EngineResult<Vec<AssetAddressIndex>> {
        require("poolId", pool_id)?;
        let mut store = self.store(state);
        store.get::<AssetPool>(&[pool_id])?;
        store.scan::<AssetAddressIndex>(&[pool_id])
    }

    /// Every sealed log address of an organization.
    pub fn query_log_index<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        org_id: &str,
    ) -> EngineResult<Vec<LogAddress>> {
        require("orgId", org_id)?;
        self.store(state).scan::<LogAddress>(&[org_id])
    }

    pub fn query_chain_log<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        tx_id: &str,
    ) -> EngineResult<ChainLog> {
        require("txId", tx_id)?;
        self.store(state).get::<ChainLog>(&[tx_id])
    }

    /// Eligible balance of the candidates in the invocation's side channel.
    pub fn query_balance<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        pool_id: &str,
        asset_type_id: &str,
    ) -> EngineResult<u128> {
        require("poolId", pool_id)?;
        require("assetTypeId", asset_type_id)?;
        let refs = candidates_from_transient(self.config(), invocation)?;
        let mut store = self.store(state);
        store.get::<AssetPool>(&[pool_id])?;
        PoolEngine::new(self.config()).balance(&mut store, pool_id, asset_type_id, &refs)
    }
}
