//! # Transaction Module
//!
//! Everything between "a signed JSON request arrived" and "these writes are
//! staged": request types, canonical signing, validation, the orchestrator
//! state machine, audit logs, and read-only queries.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        - Requests, receipts, and the TxPhase lifecycle enum
//! signing.rs      - Signed<T> / Signable: canonical bytes and signatures
//! validation.rs   - Field, amount, and side-channel checks
//! audit.rs        - Sealed private logs and public chain logs
//! orchestrator.rs - Orchestrator: addOrganization, initPool,
//!                   registerAssetType, issue, transfer
//! queries.rs      - Orchestrator's read-only operations
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Received**: the request has been parsed.
//! 2. **Validated**: shape, amount, identity, signatures, and output
//!    addresses check out.
//! 3. **PoolsResolved**: pools exist, the transfer is fundable, and the
//!    caller owns the source pool.
//! 4. **Applied**: assets minted and burned.
//! 5. **Logged**: audit records written.
//! 6. **Done**: the host may commit.
//!
//! Any failure before **Done** ends in **Rejected** and the host discards the
//! staged writes.
//!
//! ## Design Decisions
//!
//! - All stored amounts are `u64` in the smallest unit; selection sums in
//!   `u128` so large balances never overflow.
//! - Timestamps come from the [`Invocation`](crate::ledger::Invocation),
//!   never from the local clock.
//! - Both transfer outputs (recipient and change) are named and signed up
//!   front, so the signature covers exactly where value can land.

pub mod audit;
pub mod orchestrator;
pub mod queries;
pub mod signing;
pub mod types;
pub mod validation;

pub use audit::{AuditTrail, LogRecipient, SealedPrivateLog};
pub use orchestrator::{Lifecycle, Orchestrator};
pub use signing::{Signable, Signed};
pub use types::{
    AssetTypeRequest, IssueReceipt, IssueRequest, OrganizationRequest, PoolRequest, TransferReceipt,
    TransferRequest, TxPhase,
};
