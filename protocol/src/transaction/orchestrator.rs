//! The transaction orchestrator.
//!
//! Drives each state-changing request through its lifecycle and is the one
//! place where authentication, authorization, and validation order live.
//! For issue and transfer the order is fixed:
//!
//! 1. field shape and amount, then caller identity;
//! 2. request signature, then output binding signatures;
//! 3. output-address collisions;
//! 4. pool (and, for issue, asset type) resolution;
//! 5. balance sufficiency for a transfer, remaining supply for an issue;
//! 6. pool/organization attach-hash check.
//!
//! Every check runs before the first write, and so does everything else
//! that can fail on bad input (sealing addresses and audit logs). Once the engine starts applying
//! a request (`APPLIED`), a failure is a bug or a storage fault, and the
//! host throws the whole transaction away.

use tracing::{debug, info, warn};

use super::audit::{AuditTrail, LogRecipient};
use super::signing::Signed;
use super::types::{
    AssetTypeRequest, IssueReceipt, IssueRequest, OrganizationRequest, PoolRequest, TransferReceipt,
    TransferRequest, TxPhase,
};
use super::validation::{
    candidates_from_transient, check_address, check_amount, check_free_text, require,
};
use crate::config::{EngineConfig, MAX_DECIMALS};
use crate::crypto::parse_encryption_key;
use crate::error::{EngineError, EngineResult};
use crate::identity::{authorize_org, credential_fingerprint};
use crate::ledger::{Invocation, StateStore};
use crate::pool::{PoolEngine, TransferPlan, VerifiedBinding};
use crate::store::{
    AssetInfo, AssetPool, ChainLog, EntityStore, OrgIdentity, OrgPrivateLog, Organization,
    TxKind,
};

// ---------------------------------------------------------------------------
// Lifecycle tracking
// ---------------------------------------------------------------------------

/// Phase bookkeeping for one request. Phases only move forward.
#[derive(Debug)]
pub struct Lifecycle<'a> {
    operation: &'static str,
    tx_id: &'a str,
    phase: TxPhase,
}

impl<'a> Lifecycle<'a> {
    fn start(operation: &'static str, tx_id: &'a str) -> Self {
        debug!(operation, tx_id, phase = %TxPhase::Received, "request received");
        Self {
            operation,
            tx_id,
            phase: TxPhase::Received,
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    fn advance(&mut self, to: TxPhase) {
        debug_assert!(to > self.phase && !self.phase.is_terminal());
        debug!(
            operation = self.operation,
            tx_id = self.tx_id,
            from = %self.phase,
            to = %to,
            "phase transition"
        );
        self.phase = to;
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'c> {
    config: &'c EngineConfig,
    pools: PoolEngine<'c>,
    audit: AuditTrail<'c>,
}

impl<'c> Orchestrator<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self {
            config,
            pools: PoolEngine::new(config),
            audit: AuditTrail::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Run `body` inside a lifecycle, logging the outcome.
    fn run<T>(
        &self,
        operation: &'static str,
        invocation: &Invocation,
        body: impl FnOnce(&mut Lifecycle<'_>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut lifecycle = Lifecycle::start(operation, invocation.tx_id());
        match body(&mut lifecycle) {
            Ok(value) => {
                lifecycle.advance(TxPhase::Done);
                info!(operation, tx_id = invocation.tx_id(), "request done");
                Ok(value)
            }
            Err(err) => {
                warn!(
                    operation,
                    tx_id = invocation.tx_id(),
                    phase = %lifecycle.phase(),
                    to = %TxPhase::Rejected,
                    kind = %err.kind(),
                    error = %err,
                    "request rejected"
                );
                Err(err)
            }
        }
    }

    // -- addOrganization ------------------------------------------------------

    /// Register an organization for the calling credential.
    pub fn add_organization<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        request: &Signed<OrganizationRequest>,
    ) -> EngineResult<Organization> {
        self.run("addOrganization", invocation, |lc| {
            let mut store = EntityStore::new(state, &self.config.schema);
            let req = &request.body;

            require("orgId", &req.org_id)?;
            require("publicKey", &req.public_key)?;
            require("signPublicKey", &req.sign_public_key)?;
            if invocation.credential().is_empty() {
                return Err(EngineError::UnresolvedIdentity);
            }
            let caller = credential_fingerprint(invocation.credential());
            if !self.config.is_admin(&caller) {
                return Err(EngineError::Unauthorized(
                    "caller may not register organizations".into(),
                ));
            }
            let network_identity = if req.network_identity.trim().is_empty() {
                caller.clone()
            } else {
                require("networkIdentity", &req.network_identity)?;
                req.network_identity.clone()
            };
            if network_identity != caller && self.config.admin_identities.is_empty() {
                return Err(EngineError::Unauthorized(
                    "only a configured admin may register another identity".into(),
                ));
            }

            request.verify(&req.sign_public_key)?;
            parse_encryption_key(&req.public_key)?;
            lc.advance(TxPhase::Validated);

            if store.exists::<Organization>(&[&req.org_id])? {
                return Err(EngineError::AlreadyExists {
                    entity: "organization",
                    key: req.org_id.clone(),
                });
            }
            if store.exists::<OrgIdentity>(&[&network_identity])? {
                return Err(EngineError::AlreadyExists {
                    entity: "orgIdentity",
                    key: network_identity,
                });
            }

            let org = Organization {
                org_id: req.org_id.clone(),
                public_key: req.public_key.clone(),
                sign_public_key: req.sign_public_key.clone(),
                network_identity: network_identity.clone(),
            };
            store.insert_new(&org)?;
            store.insert_new(&OrgIdentity {
                network_identity,
                org_id: org.org_id.clone(),
            })?;
            lc.advance(TxPhase::Applied);
            Ok(org)
        })
    }

    // -- initPool -------------------------------------------------------------

    /// Create an asset pool owned by the calling organization.
    pub fn init_pool<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        request: &Signed<PoolRequest>,
    ) -> EngineResult<AssetPool> {
        self.run("initPool", invocation, |lc| {
            let mut store = EntityStore::new(state, &self.config.schema);
            let req = &request.body;

            require("orgId", &req.org_id)?;
            require("poolId", &req.pool_id)?;
            require("publicKey", &req.public_key)?;
            let org = authorize_org(&mut store, invocation, &req.org_id)?;
            request.verify(&org.sign_public_key)?;
            lc.advance(TxPhase::Validated);

            let pool = self.pools.init_pool(
                &mut store,
                &req.pool_id,
                &req.pool_type,
                &req.public_key,
                &org,
            )?;
            lc.advance(TxPhase::Applied);
            Ok(pool)
        })
    }

    // -- registerAssetType -----------------------------------------------------

    /// Register an asset type on behalf of the calling organization.
    pub fn register_asset_type<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        request: &Signed<AssetTypeRequest>,
    ) -> EngineResult<AssetInfo> {
        self.run("registerAssetType", invocation, |lc| {
            let mut store = EntityStore::new(state, &self.config.schema);
            let req = &request.body;

            require("orgId", &req.org_id)?;
            require("assetTypeId", &req.asset_type_id)?;
            require("assetName", &req.asset_name)?;
            require("assetSymbol", &req.asset_symbol)?;
            if req.decimals > MAX_DECIMALS {
                return Err(EngineError::validation(format!(
                    "decimals must be at most {MAX_DECIMALS}, got {}",
                    req.decimals
                )));
            }
            if req.total_supply < 0 {
                return Err(EngineError::InvalidAmount(format!(
                    "totalSupply must not be negative, got {}",
                    req.total_supply
                )));
            }
            let total_supply = check_amount(req.total_supply, true)?;
            let org = authorize_org(&mut store, invocation, &req.org_id)?;
            request.verify(&org.sign_public_key)?;
            lc.advance(TxPhase::Validated);

            let info = self.pools.register_asset_type(
                &mut store,
                AssetInfo {
                    asset_type_id: req.asset_type_id.clone(),
                    asset_name: req.asset_name.clone(),
                    asset_symbol: req.asset_symbol.clone(),
                    decimals: req.decimals,
                    total_supply,
                    issued: 0,
                    registered_by: org.org_id,
                },
            )?;
            lc.advance(TxPhase::Applied);
            Ok(info)
        })
    }

    // -- issue ----------------------------------------------------------------

    /// Mint `amount` into one of the caller's pools.
    pub fn issue<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        request: &Signed<IssueRequest>,
    ) -> EngineResult<IssueReceipt> {
        self.run("issue", invocation, |lc| {
            let mut store = EntityStore::new(state, &self.config.schema);
            let req = &request.body;

            // (a) shape, amount, identity
            require("orgId", &req.org_id)?;
            require("toPool", &req.to_pool)?;
            require("assetTypeId", &req.asset_type_id)?;
            check_address(self.config, "newAssetAddr", &req.new_asset_addr)?;
            require("newAssetSign", &req.new_asset_sign)?;
            check_free_text(self.config, "logInfo", &req.log_info)?;
            let amount = check_amount(req.amount, self.config.allow_zero_issue)?;
            let org = authorize_org(&mut store, invocation, &req.org_id)?;

            // (b) signatures
            request.verify(&org.sign_public_key)?;
            let binding = VerifiedBinding::verify(
                &req.to_pool,
                &req.new_asset_addr,
                &req.asset_type_id,
                &org,
                &req.new_asset_sign,
            )?;

            // (c) collisions
            self.pools.ensure_address_free(&mut store, &req.new_asset_addr)?;
            lc.advance(TxPhase::Validated);

            let asset_type = store.get::<AssetInfo>(&[&req.asset_type_id])?;
            let pool = store.get::<AssetPool>(&[&req.to_pool])?;
            // (d) supply
            let asset_type = self.pools.reserve_supply(asset_type, amount)?;
            // (e) only into pools the caller owns
            self.pools.verify_pool_owner(&pool, &org.org_id)?;
            lc.advance(TxPhase::PoolsResolved);

            let asset = self.pools.mint(&mut store, &pool, &binding, amount)?;
            store.put(&asset_type)?;
            lc.advance(TxPhase::Applied);

            let chain_log = ChainLog {
                log_id: self.audit.chain_log_id(invocation.tx_id()),
                tx_id: invocation.tx_id().to_string(),
                kind: TxKind::Issue,
                from_pool: String::new(),
                to_pool: pool.pool_id.clone(),
                asset_type_id: req.asset_type_id.clone(),
                value: amount,
                timestamp: invocation.timestamp(),
            };
            self.audit.write_chain_log(&mut store, &chain_log)?;
            lc.advance(TxPhase::Logged);

            Ok(IssueReceipt {
                tx_id: invocation.tx_id().to_string(),
                asset,
                chain_log_id: chain_log.log_id,
            })
        })
    }

    // -- transfer -------------------------------------------------------------

    /// Move `amount` out of one of the caller's pools.
    pub fn transfer<S: StateStore + ?Sized>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        request: &Signed<TransferRequest>,
    ) -> EngineResult<TransferReceipt> {
        self.run("transfer", invocation, |lc| {
            let mut store = EntityStore::new(state, &self.config.schema);
            let req = &request.body;

            // (a) shape, amount, identity
            require("orgId", &req.org_id)?;
            require("fromPool", &req.from_pool)?;
            require("toPool", &req.to_pool)?;
            require("assetTypeId", &req.asset_type_id)?;
            let (output_addr, change_addr) = output_pair("newAssetAddrs", &req.new_asset_addrs)?;
            let (output_sign, change_sign) = output_pair("newAssetSigns", &req.new_asset_signs)?;
            check_address(self.config, "newAssetAddrs[0]", output_addr)?;
            check_address(self.config, "newAssetAddrs[1]", change_addr)?;
            if output_addr == change_addr {
                return Err(EngineError::validation(
                    "output and change addresses must differ",
                ));
            }
            check_free_text(self.config, "logInfo", &req.log_info)?;
            check_free_text(self.config, "modUser", &req.mod_user)?;
            let amount = check_amount(req.amount, false)?;
            let refs = candidates_from_transient(self.config, invocation)?;
            let org = authorize_org(&mut store, invocation, &req.org_id)?;

            // (b) signatures
            request.verify(&org.sign_public_key)?;
            let output = VerifiedBinding::verify(
                &req.to_pool,
                output_addr,
                &req.asset_type_id,
                &org,
                output_sign,
            )?;
            let change_output = VerifiedBinding::verify(
                &req.from_pool,
                change_addr,
                &req.asset_type_id,
                &org,
                change_sign,
            )?;

            // (c) collisions
            self.pools.ensure_address_free(&mut store, output_addr)?;
            self.pools.ensure_address_free(&mut store, change_addr)?;
            lc.advance(TxPhase::Validated);

            let source = store.get::<AssetPool>(&[&req.from_pool])?;
            let destination = store.get::<AssetPool>(&[&req.to_pool])?;

            // (d) sufficiency
            let candidates = self.pools.load_candidates(&mut store, &source.pool_id, &refs)?;
            let eligible = self.pools.filter_eligible(
                &mut store,
                &source.pool_id,
                &req.asset_type_id,
                candidates,
            )?;
            let selection = self.pools.plan(&eligible, amount)?;

            // (e) ownership of the source pool
            self.pools.verify_pool_owner(&source, &org.org_id)?;

            let payer = LogRecipient::for_org(&org)?;
            let payee_org = store.get::<Organization>(&[&destination.org_id])?;
            let payee = LogRecipient::for_org(&payee_org)?;

            let tx_id = invocation.tx_id();
            let mut sealed_logs = Vec::with_capacity(2);
            for (recipient, kind) in [(&payer, TxKind::Outcome), (&payee, TxKind::Income)] {
                let log = OrgPrivateLog {
                    log_id: self.audit.private_log_id(tx_id, kind),
                    tx_id: tx_id.to_string(),
                    kind,
                    org_id: recipient.org_id().to_string(),
                    from_pool: source.pool_id.clone(),
                    to_pool: destination.pool_id.clone(),
                    asset_type_id: req.asset_type_id.clone(),
                    value: amount,
                    log_info: req.log_info.clone(),
                    mod_user: req.mod_user.clone(),
                    timestamp: invocation.timestamp(),
                };
                sealed_logs.push(self.audit.seal_private_log(recipient, &log)?);
            }
            lc.advance(TxPhase::PoolsResolved);

            let mut eligible = eligible.into_iter().map(Some).collect::<Vec<_>>();
            let inputs = selection
                .selected
                .iter()
                .filter_map(|&i| eligible.get_mut(i).and_then(Option::take))
                .collect();
            let plan = TransferPlan {
                source,
                destination,
                inputs,
                amount,
                change: selection.change,
                output,
                change_output,
            };
            let outcome = self.pools.apply_transfer(&mut store, &plan)?;
            lc.advance(TxPhase::Applied);

            let mut private_log_ids = Vec::with_capacity(sealed_logs.len());
            for sealed in sealed_logs {
                private_log_ids.push(self.audit.write_private_log(&mut store, sealed)?);
            }

            let chain_log = ChainLog {
                log_id: self.audit.chain_log_id(tx_id),
                tx_id: tx_id.to_string(),
                kind: TxKind::Transfer,
                from_pool: plan.source.pool_id.clone(),
                to_pool: plan.destination.pool_id.clone(),
                asset_type_id: req.asset_type_id.clone(),
                value: amount,
                timestamp: invocation.timestamp(),
            };
            self.audit.write_chain_log(&mut store, &chain_log)?;
            lc.advance(TxPhase::Logged);

            Ok(TransferReceipt {
                tx_id: tx_id.to_string(),
                outcome,
                private_log_ids,
                chain_log_id: chain_log.log_id,
            })
        })
    }
}

/// Exactly two non-blank entries: `[output, change]`.
fn output_pair<'r>(field: &str, values: &'r [String]) -> EngineResult<(&'r str, &'r str)> {
    match values {
        [output, change] => {
            require(&format!("{field}[0]"), output)?;
            require(&format!("{field}[1]"), change)?;
            Ok((output.as_str(), change.as_str()))
        }
        _ => Err(EngineError::validation(format!(
            "{field} must hold exactly 2 entries (output, change), got {}",
            values.len()
        ))),
    }
}
