//! # Tessera Chaincode
//!
//! The host-facing side of Tessera. The protocol crate knows how to validate
//! and apply a request against a `StateStore`; this crate turns that into
//! something a ledger host can call:
//!
//! - **Dispatch**: named operations (`issue`, `transfer`, `queryByAddress`,
//!   ...) taking JSON arguments and returning a [`Response`].
//! - **Atomicity**: each invocation runs in its own `LedgerTx`. Success
//!   commits the staged writes; any failure drops them.
//! - **Storage**: [`SledLedger`], a durable `LedgerBackend` on sled.
//! - **Bootstrap**: file configuration and `tracing` setup.
//!
//! ## Design Principles
//!
//! 1. The first error wins and is returned verbatim as `KIND: message`.
//! 2. Nothing is retried here. A commit conflict is the caller's to resubmit.
//! 3. Every argument and payload is plain camelCase JSON.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod sled_ledger;

pub use config::ChaincodeConfig;
pub use dispatch::{BalancePayload, Chaincode, Operation, Response};
pub use logging::{init_logging, LogFormat};
pub use sled_ledger::SledLedger;
