// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tessera Protocol: Core Library
//!
//! Tessera is a confidential asset-pool transfer engine. Organizations own
//! pools, pools hold assets, and value moves between pools by burning
//! unspent assets and minting new ones. Nobody but a pool's key holder can
//! tell which assets are in it, and nobody but an organization can read its
//! own transaction history.
//!
//! ## Architecture
//!
//! - **config**: protocol constants, the ledger schema, engine settings.
//! - **crypto**: Ed25519 signatures, X25519 sealed boxes, hashing, PEM keys.
//! - **error**: the engine's error type and its stable wire codes.
//! - **ledger**: the versioned key-value store the engine runs against.
//! - **store**: typed entities over the ledger.
//! - **identity**: who the caller is, and whether they may act for an org.
//! - **pool**: binding signatures, eligibility, selection, mint and burn.
//! - **transaction**: request types, validation, the orchestrator, queries.
//! - **wallet**: the client side. Keys, request signing, opening sealed data.
//!
//! ## Design Philosophy
//!
//! 1. Which assets move is a pure function of the request and the ledger.
//!    Timestamps and tx ids come from the invocation, never the local clock.
//! 2. A request either stages all of its writes or none of them.
//! 3. Conservation is checked arithmetic, not hope: sums are `u128`.
//! 4. If it touches value, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod pool;
pub mod store;
pub mod transaction;
pub mod wallet;

pub use config::{EngineConfig, Schema};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use ledger::{Invocation, LedgerBackend, LedgerTx, MemoryLedger, StateStore};
pub use transaction::Orchestrator;
pub use wallet::{OrgWallet, TransferDraft};
