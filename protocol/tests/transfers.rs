//! End-to-end tests for the Tessera engine.
//!
//! Each test builds its own in-memory ledger, onboards organizations through
//! their wallets, and drives issue and transfer the way a host would: one
//! `LedgerTx` per request, committed on success and dropped on failure.

use tessera_protocol::crypto::{open_sealed, SealingKeypair, SigningKeypair};
use tessera_protocol::ledger::LedgerError;
use tessera_protocol::pool::{sign_binding, CandidateRef};
use tessera_protocol::store::{Asset, AssetInfo, EntityStore, TxKind};
use tessera_protocol::transaction::{IssueReceipt, TransferReceipt};
use tessera_protocol::{
    EngineConfig, EngineError, EngineResult, ErrorKind, Invocation, LedgerTx, MemoryLedger,
    Orchestrator, OrgWallet, TransferDraft,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Party {
    wallet: OrgWallet,
    credential: Vec<u8>,
}

impl Party {
    fn new(org_id: &str) -> Self {
        Self {
            wallet: OrgWallet::generate(org_id),
            credential: format!("x509::CN={org_id}::O=tessera").into_bytes(),
        }
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.credential.clone())
    }
}

struct Harness {
    ledger: MemoryLedger,
    config: EngineConfig,
}

impl Harness {
    fn new() -> Self {
        Self {
            ledger: MemoryLedger::new(),
            config: EngineConfig::default(),
        }
    }

    /// Run one request in its own ledger transaction, the way a host does.
    fn submit<T>(
        &self,
        f: impl FnOnce(&Orchestrator<'_>, &mut LedgerTx<'_, MemoryLedger>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let orchestrator = Orchestrator::new(&self.config);
        let mut tx = LedgerTx::begin(&self.ledger);
        let out = f(&orchestrator, &mut tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn onboard(&self, org_id: &str, pools: &[&str]) -> Party {
        let mut party = Party::new(org_id);
        let request = party.wallet.organization_request(None).unwrap();
        self.submit(|o, s| o.add_organization(s, &party.invocation(), &request))
            .unwrap();
        for pool in pools {
            let request = party.wallet.create_pool(pool, "cash").unwrap();
            self.submit(|o, s| o.init_pool(s, &party.invocation(), &request))
                .unwrap();
        }
        party
    }

    fn register_type(&self, party: &Party, asset_type_id: &str, total_supply: i64) -> EngineResult<AssetInfo> {
        let request = party
            .wallet
            .asset_type_request(asset_type_id, asset_type_id, asset_type_id, 2, total_supply)?;
        self.submit(|o, s| o.register_asset_type(s, &party.invocation(), &request))
    }

    fn issue(&self, party: &Party, pool: &str, amount: i64, address: &str) -> EngineResult<IssueReceipt> {
        self.issue_type(party, pool, "USD", amount, address)
    }

    fn issue_type(
        &self,
        party: &Party,
        pool: &str,
        asset_type_id: &str,
        amount: i64,
        address: &str,
    ) -> EngineResult<IssueReceipt> {
        let request = party.wallet.issue_request(pool, asset_type_id, amount, address)?;
        self.submit(|o, s| o.issue(s, &party.invocation(), &request))
    }

    /// Rewrite a stored asset behind the engine's back.
    fn tamper_asset(&self, address: &str, edit: impl FnOnce(&mut Asset)) {
        let mut tx = LedgerTx::begin(&self.ledger);
        {
            let mut store = EntityStore::new(&mut tx, &self.config.schema);
            let mut asset: Asset = store.get(&[address]).unwrap();
            edit(&mut asset);
            store.put(&asset).unwrap();
        }
        tx.commit().unwrap();
    }

    /// Every index entry of `pool`, opened with `owner`'s pool key and
    /// paired with the asset it names.
    fn index_with_assets(&self, owner: &Party, pool: &str) -> Vec<(bool, String, Asset)> {
        let key = owner.wallet.pool_key(pool).unwrap();
        self.submit(|o, s| o.query_pool_index(s, pool))
            .unwrap()
            .into_iter()
            .map(|entry| {
                let address = String::from_utf8(open_sealed(key, &entry.encrypted_address).unwrap()).unwrap();
                let asset = self.submit(|o, s| o.query_asset(s, &address)).unwrap();
                (entry.spent, entry.encrypted_address, asset)
            })
            .collect()
    }

    /// The invocation a wallet would send for a transfer out of `pool`.
    fn transfer_invocation(&self, party: &Party, pool: &str) -> Invocation {
        let index = self
            .submit(|o, s| o.query_pool_index(s, pool))
            .unwrap();
        let refs = party.wallet.owned_candidates(pool, "USD", &index);
        party.invocation().with_transient(
            self.config.schema.candidates_key.clone(),
            OrgWallet::candidates_transient(&refs).unwrap(),
        )
    }

    fn transfer(&self, party: &Party, draft: &TransferDraft) -> EngineResult<TransferReceipt> {
        let invocation = self.transfer_invocation(party, &draft.from_pool);
        let request = party.wallet.transfer_request(draft)?;
        self.submit(|o, s| o.transfer(s, &invocation, &request))
    }

    fn balance(&self, party: &Party, pool: &str) -> u128 {
        let invocation = self.transfer_invocation(party, pool);
        self.submit(|o, s| o.query_balance(s, &invocation, pool, "USD"))
            .unwrap()
    }
}

/// org1 owns P1 holding one asset of 100 at "a1"; org2 owns P2. "USD" is
/// registered without a supply cap.
fn funded() -> (Harness, Party, Party) {
    let h = Harness::new();
    let org1 = h.onboard("org1", &["P1"]);
    let org2 = h.onboard("org2", &["P2"]);
    h.register_type(&org1, "USD", 0).unwrap();
    h.issue(&org1, "P1", 100, "a1").unwrap();
    (h, org1, org2)
}

fn kind<T: std::fmt::Debug>(result: EngineResult<T>) -> ErrorKind {
    result.unwrap_err().kind()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn issue_credits_pool_balance() {
    let (h, org1, _) = funded();
    assert_eq!(h.balance(&org1, "P1"), 100);

    let asset = h.submit(|o, s| o.query_asset(s, "a1")).unwrap();
    assert_eq!(asset.value, 100);
    assert!(!asset.spent);
    assert_eq!(asset.minter, "org1");
}

#[test]
fn transfer_splits_into_output_and_change() {
    let (h, org1, org2) = funded();
    let draft = TransferDraft::new("P1", "P2", "USD", 40).with_addresses("a2", "a3");
    let receipt = h.transfer(&org1, &draft).unwrap();

    assert_eq!(receipt.outcome.burned, vec!["a1".to_string()]);
    assert_eq!(receipt.outcome.output.pool_id, "P2");
    assert_eq!(receipt.outcome.output.value, 40);
    let change = receipt.outcome.change.clone().unwrap();
    assert_eq!((change.address.as_str(), change.pool_id.as_str(), change.value), ("a3", "P1", 60));

    assert!(h.submit(|o, s| o.query_asset(s, "a1")).unwrap().spent);
    assert_eq!(h.submit(|o, s| o.query_asset(s, "a2")).unwrap().value, 40);
    assert_eq!(h.balance(&org1, "P1"), 60);
    assert_eq!(h.balance(&org2, "P2"), 40);
}

#[test]
fn exact_transfer_mints_no_change() {
    let (h, org1, org2) = funded();
    let receipt = h
        .transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 100))
        .unwrap();
    assert!(receipt.outcome.change.is_none());
    assert_eq!(h.balance(&org1, "P1"), 0);
    assert_eq!(h.balance(&org2, "P2"), 100);
}

#[test]
fn insufficient_balance_changes_nothing() {
    let (h, org1, _) = funded();
    let before = h.ledger.snapshot();

    let err = h
        .transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 150))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert!(matches!(
        err,
        EngineError::InsufficientBalance { available: 100, requested: 150 }
    ));
    assert_eq!(h.ledger.snapshot(), before);
}

#[test]
fn wrong_signing_key_rejected_before_balance_check() {
    let (h, org1, _) = funded();
    let impostor = OrgWallet::from_keys("org1", SigningKeypair::generate(), SealingKeypair::generate());
    let invocation = h.transfer_invocation(&org1, "P1");
    let request = impostor
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 1_000))
        .unwrap();

    let result = h.submit(|o, s| o.transfer(s, &invocation, &request));
    assert_eq!(kind(result), ErrorKind::SignatureInvalid);
}

#[test]
fn issue_to_existing_address_rejected() {
    let (h, org1, _) = funded();
    let before = h.ledger.snapshot();
    assert_eq!(kind(h.issue(&org1, "P1", 5, "a1")), ErrorKind::AlreadyExists);
    assert_eq!(h.ledger.snapshot(), before);
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn value_is_conserved_across_transfers() {
    let (h, org1, org2) = funded();
    h.issue(&org1, "P1", 250, "a4").unwrap();

    h.transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 120)).unwrap();
    h.transfer(&org2, &TransferDraft::new("P2", "P2", "USD", 70)).unwrap();
    h.transfer(&org2, &TransferDraft::new("P2", "P1", "USD", 33)).unwrap();
    h.transfer(&org1, &TransferDraft::new("P1", "P1", "USD", 200)).unwrap();

    let total = h.balance(&org1, "P1") + h.balance(&org2, "P2");
    assert_eq!(total, 350);
    assert_eq!(h.balance(&org2, "P2"), 87);
}

#[test]
fn spent_asset_cannot_fund_a_second_transfer() {
    let (h, org1, _) = funded();
    // Keep the side channel from before the first transfer.
    let stale = h.transfer_invocation(&org1, "P1");
    h.transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 100)).unwrap();

    let request = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 100))
        .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &stale, &request));
    assert_eq!(kind(result), ErrorKind::InsufficientBalance);
}

#[test]
fn interleaved_transfers_conflict_on_commit() {
    let (h, org1, _) = funded();
    let orchestrator = Orchestrator::new(&h.config);
    let invocation = h.transfer_invocation(&org1, "P1");
    let first = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 60))
        .unwrap();
    let second = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 60))
        .unwrap();

    let mut tx1 = LedgerTx::begin(&h.ledger);
    let mut tx2 = LedgerTx::begin(&h.ledger);
    orchestrator.transfer(&mut tx1, &invocation, &first).unwrap();
    orchestrator.transfer(&mut tx2, &invocation, &second).unwrap();

    assert!(tx1.commit().unwrap().is_some());
    let err = tx2.commit().unwrap_err();
    assert!(matches!(err, LedgerError::Conflict { .. }));
    assert_eq!(EngineError::from(err).kind(), ErrorKind::StorageError);
    assert_eq!(h.balance(&org1, "P1"), 40);
}

#[test]
fn concurrent_transfers_spend_an_asset_once() {
    let (h, org1, _) = funded();
    let requests: Vec<_> = (0..4)
        .map(|_| {
            org1.wallet
                .transfer_request(&TransferDraft::new("P1", "P2", "USD", 70))
                .unwrap()
        })
        .collect();
    let invocation = h.transfer_invocation(&org1, "P1");

    let successes = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| {
                let (h, invocation) = (&h, &invocation);
                scope.spawn(move || h.submit(|o, s| o.transfer(s, invocation, request)).is_ok())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(successes, 1);
    assert_eq!(h.balance(&org1, "P1"), 30);
}

#[test]
fn selection_burns_smallest_assets_first() {
    let h = Harness::new();
    let org1 = h.onboard("org1", &["P1"]);
    let _org2 = h.onboard("org2", &["P2"]);
    h.register_type(&org1, "USD", 0).unwrap();
    for (address, value) in [("b30", 30), ("b10", 10), ("b20", 20)] {
        h.issue(&org1, "P1", value, address).unwrap();
    }

    let receipt = h
        .transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 25))
        .unwrap();
    let mut burned = receipt.outcome.burned.clone();
    burned.sort();
    assert_eq!(burned, vec!["b10".to_string(), "b20".to_string()]);
    assert_eq!(receipt.outcome.change.unwrap().value, 5);
    assert!(!h.submit(|o, s| o.query_asset(s, "b30")).unwrap().spent);
}

// ---------------------------------------------------------------------------
// Validation order and authorization
// ---------------------------------------------------------------------------

#[test]
fn empty_field_reported_before_bad_signature() {
    let (h, org1, _) = funded();
    let impostor = OrgWallet::generate("org1");
    let mut draft = TransferDraft::new("P1", "P2", "USD", 10);
    draft.to_pool = String::new();
    let request = impostor.transfer_request(&draft).unwrap();
    let result = h.submit(|o, s| o.transfer(s, &org1.invocation(), &request));
    assert_eq!(kind(result), ErrorKind::ValidationError);
}

#[test]
fn address_collision_reported_before_balance() {
    let (h, org1, _) = funded();
    let draft = TransferDraft::new("P1", "P2", "USD", 1_000).with_addresses("a1", "fresh");
    assert_eq!(kind(h.transfer(&org1, &draft)), ErrorKind::AlreadyExists);
}

#[test]
fn balance_checked_before_pool_ownership() {
    let (h, org1, org2) = funded();
    // org2 names org1's assets in a pool it doesn't own.
    let index = h.submit(|o, s| o.query_pool_index(s, "P1")).unwrap();
    let refs = org1.wallet.owned_candidates("P1", "USD", &index);
    let invocation = org2.invocation().with_transient(
        h.config.schema.candidates_key.clone(),
        OrgWallet::candidates_transient(&refs).unwrap(),
    );

    let too_much = org2
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 500))
        .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &invocation, &too_much));
    assert_eq!(kind(result), ErrorKind::InsufficientBalance);

    let affordable = org2
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 50))
        .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &invocation, &affordable));
    assert_eq!(kind(result), ErrorKind::Unauthorized);
    assert_eq!(h.balance(&org1, "P1"), 100);
}

#[test]
fn caller_cannot_act_for_another_org() {
    let (h, org1, org2) = funded();
    let request = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 10))
        .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &org2.invocation(), &request));
    assert_eq!(kind(result), ErrorKind::Unauthorized);

    let stranger = Invocation::new(b"unknown-cert".to_vec());
    let result = h.submit(|o, s| o.transfer(s, &stranger, &request));
    assert_eq!(kind(result), ErrorKind::UnresolvedIdentity);
}

#[test]
fn issue_only_into_own_pool() {
    let (h, org1, _) = funded();
    assert_eq!(kind(h.issue(&org1, "P2", 10, "x1")), ErrorKind::Unauthorized);
    assert_eq!(kind(h.issue(&org1, "P9", 10, "x1")), ErrorKind::NotFound);
    assert_eq!(kind(h.issue(&org1, "P1", -3, "x1")), ErrorKind::InvalidAmount);
}

#[test]
fn output_binding_must_name_its_pool() {
    let (h, org1, _) = funded();
    let invocation = h.transfer_invocation(&org1, "P1");
    let mut request = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 10))
        .unwrap();
    // Swap the bindings: each now names the other pool. Re-sign the request
    // so only the bindings are wrong.
    request.body.new_asset_signs.swap(0, 1);
    let request = tessera_protocol::transaction::Signed::sign(
        request.body,
        org1.wallet.signing_key(),
    )
    .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &invocation, &request));
    assert_eq!(kind(result), ErrorKind::SignatureInvalid);
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[test]
fn private_logs_readable_only_by_their_org() {
    let (h, org1, org2) = funded();
    let draft = TransferDraft::new("P1", "P2", "USD", 40).with_log_info("invoice 17");
    let receipt = h.transfer(&org1, &draft).unwrap();
    assert_eq!(receipt.private_log_ids.len(), 2);

    let index = h.submit(|o, s| o.query_log_index(s, "org1")).unwrap();
    let ids = org1.wallet.recover_log_ids(&index);
    assert_eq!(ids, vec![receipt.private_log_ids[0].clone()]);

    let sealed = h.submit(|o, s| o.query_logs(s, &ids)).unwrap();
    let log = org1.wallet.open_log(&sealed[0]).unwrap();
    assert_eq!(log.kind, TxKind::Outcome);
    assert_eq!(log.value, 40);
    assert_eq!(log.log_info, "invoice 17");
    assert_eq!(kind(org2.wallet.open_log(&sealed[0])), ErrorKind::DecryptionError);

    let index = h.submit(|o, s| o.query_log_index(s, "org2")).unwrap();
    let ids = org2.wallet.recover_log_ids(&index);
    let sealed = h.submit(|o, s| o.query_logs(s, &ids)).unwrap();
    assert_eq!(org2.wallet.open_log(&sealed[0]).unwrap().kind, TxKind::Income);
}

#[test]
fn chain_log_records_public_movement() {
    let (h, org1, _) = funded();
    let invocation = h.transfer_invocation(&org1, "P1").with_tx_id("tx-42");
    let request = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 25))
        .unwrap();
    h.submit(|o, s| o.transfer(s, &invocation, &request)).unwrap();

    let log = h.submit(|o, s| o.query_chain_log(s, "tx-42")).unwrap();
    assert_eq!(log.kind, TxKind::Transfer);
    assert_eq!((log.from_pool.as_str(), log.to_pool.as_str()), ("P1", "P2"));
    assert_eq!(log.value, 25);
}

// ---------------------------------------------------------------------------
// Candidate pairing and binding integrity
// ---------------------------------------------------------------------------

#[test]
fn candidate_cannot_borrow_another_assets_index_entry() {
    let (h, org1, _) = funded();
    h.issue(&org1, "P1", 50, "a2").unwrap();
    let index = h.submit(|o, s| o.query_pool_index(s, "P1")).unwrap();
    let refs = org1.wallet.owned_candidates("P1", "USD", &index);
    let index_of = |address: &str| {
        refs.iter()
            .find(|r| r.address == address)
            .map(|r| r.index_id.clone())
            .unwrap()
    };
    let before = h.ledger.snapshot();

    let crossed = vec![CandidateRef {
        address: "a1".into(),
        index_id: index_of("a2"),
    }];
    let invocation = org1.invocation().with_transient(
        h.config.schema.candidates_key.clone(),
        OrgWallet::candidates_transient(&crossed).unwrap(),
    );
    let request = org1
        .wallet
        .transfer_request(&TransferDraft::new("P1", "P2", "USD", 40))
        .unwrap();
    let result = h.submit(|o, s| o.transfer(s, &invocation, &request));
    assert_eq!(kind(result), ErrorKind::ValidationError);
    assert_eq!(h.ledger.snapshot(), before);

    // The honest pairing still spends, and a2 stays visible to its owner.
    h.transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 40)).unwrap();
    assert_eq!(h.balance(&org1, "P1"), 110);
}

#[test]
fn spent_flags_move_together() {
    let (h, org1, org2) = funded();
    h.issue(&org1, "P1", 50, "a2").unwrap();
    h.transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 120)).unwrap();
    h.transfer(&org2, &TransferDraft::new("P2", "P1", "USD", 20)).unwrap();

    for (owner, pool) in [(&org1, "P1"), (&org2, "P2")] {
        let entries = h.index_with_assets(owner, pool);
        assert!(!entries.is_empty());
        for (index_spent, index_id, asset) in entries {
            assert_eq!(index_spent, asset.spent, "asset {}", asset.address);
            assert_eq!(index_id, asset.index_id);
        }
    }
    assert!(h.submit(|o, s| o.query_asset(s, "a1")).unwrap().spent);
    assert!(h.submit(|o, s| o.query_asset(s, "a2")).unwrap().spent);
}

#[test]
fn asset_with_foreign_binding_is_not_spendable() {
    let (h, org1, _) = funded();
    // A valid signature, but for another pool.
    let misplaced = sign_binding(org1.wallet.signing_key(), "P2", "a1", "USD");
    h.tamper_asset("a1", |asset| asset.sign = misplaced);
    assert_eq!(h.balance(&org1, "P1"), 0);

    let before = h.ledger.snapshot();
    let err = h
        .transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 40))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientBalance { available: 0, requested: 40 }
    ));
    assert_eq!(h.ledger.snapshot(), before);
    assert!(!h.submit(|o, s| o.query_asset(s, "a1")).unwrap().spent);
}

#[test]
fn asset_reattributed_to_another_minter_is_not_spendable() {
    let (h, org1, _) = funded();
    h.tamper_asset("a1", |asset| asset.minter = "org2".into());

    let before = h.ledger.snapshot();
    let result = h.transfer(&org1, &TransferDraft::new("P1", "P2", "USD", 40));
    assert_eq!(kind(result), ErrorKind::InsufficientBalance);
    assert_eq!(h.ledger.snapshot(), before);
}

// ---------------------------------------------------------------------------
// Asset types
// ---------------------------------------------------------------------------

#[test]
fn issue_requires_a_registered_type() {
    let (h, org1, _) = funded();
    let before = h.ledger.snapshot();
    assert_eq!(kind(h.issue_type(&org1, "P1", "EUR", 10, "e1")), ErrorKind::NotFound);
    assert_eq!(h.ledger.snapshot(), before);

    h.register_type(&org1, "EUR", 0).unwrap();
    h.issue_type(&org1, "P1", "EUR", 10, "e1").unwrap();
    let info = h.submit(|o, s| o.query_asset_type(s, "EUR")).unwrap();
    assert_eq!((info.issued, info.registered_by.as_str()), (10, "org1"));
}

#[test]
fn issuance_is_capped_by_total_supply() {
    let (h, org1, org2) = funded();
    h.register_type(&org1, "GOLD", 150).unwrap();
    h.issue_type(&org1, "P1", "GOLD", 100, "g1").unwrap();
    // Any organization may issue a registered type into its own pool.
    h.issue_type(&org2, "P2", "GOLD", 30, "g2").unwrap();

    let before = h.ledger.snapshot();
    assert_eq!(kind(h.issue_type(&org1, "P1", "GOLD", 21, "g3")), ErrorKind::InvalidAmount);
    assert_eq!(h.ledger.snapshot(), before);

    h.issue_type(&org1, "P1", "GOLD", 20, "g3").unwrap();
    let info = h.submit(|o, s| o.query_asset_type(s, "GOLD")).unwrap();
    assert_eq!(info.issued, 150);
    assert_eq!(info.remaining(), Some(0));
}

#[test]
fn asset_type_registration_rules() {
    let (h, org1, org2) = funded();
    assert_eq!(kind(h.register_type(&org2, "USD", 0)), ErrorKind::AlreadyExists);
    assert_eq!(kind(h.register_type(&org1, "BAD", -1)), ErrorKind::InvalidAmount);

    let request = org1
        .wallet
        .asset_type_request("TOKEN", "Token", "TKN", 30, 0)
        .unwrap();
    let result = h.submit(|o, s| o.register_asset_type(s, &org1.invocation(), &request));
    assert_eq!(kind(result), ErrorKind::ValidationError);

    // Registering on behalf of another organization.
    let request = org1
        .wallet
        .asset_type_request("TOKEN", "Token", "TKN", 0, 0)
        .unwrap();
    let result = h.submit(|o, s| o.register_asset_type(s, &org2.invocation(), &request));
    assert_eq!(kind(result), ErrorKind::Unauthorized);
    assert_eq!(kind(h.submit(|o, s| o.query_asset_type(s, "TOKEN"))), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Input limits
// ---------------------------------------------------------------------------

#[test]
fn oversized_inputs_rejected_before_any_write() {
    let (h, org1, _) = funded();
    let long = "x".repeat(h.config.max_sealed_plaintext + 1);
    let before = h.ledger.snapshot();

    assert_eq!(kind(h.issue(&org1, "P1", 5, &long)), ErrorKind::ValidationError);

    let draft = TransferDraft::new("P1", "P2", "USD", 10).with_addresses(&long, "change");
    assert_eq!(kind(h.transfer(&org1, &draft)), ErrorKind::ValidationError);

    let verbose = "u".repeat(h.config.max_log_info_len + 1);
    let draft = TransferDraft::new("P1", "P2", "USD", 10).with_mod_user(&verbose);
    assert_eq!(kind(h.transfer(&org1, &draft)), ErrorKind::ValidationError);

    assert_eq!(h.ledger.snapshot(), before);
}
