//! # Operation Dispatch
//!
//! Maps a named function plus JSON arguments onto the orchestrator, inside
//! one ledger transaction per invocation.
//!
//! ## Operations
//!
//! | Function             | Arguments                          | Payload              |
//! |----------------------|------------------------------------|----------------------|
//! | `addOrganization`    | signed `OrganizationRequest`       | `Organization`       |
//! | `initPool`           | signed `PoolRequest`               | `AssetPool`          |
//! | `registerAssetType`  | signed `AssetTypeRequest`          | `AssetInfo`          |
//! | `issue`              | signed `IssueRequest`              | `IssueReceipt`       |
//! | `transfer`           | signed `TransferRequest`           | `TransferReceipt`    |
//! | `queryByAddress`     | `{address}`                        | `Asset`              |
//! | `queryLogsByAddress` | `{logIds}`                         | `[SealedLog]`        |
//! | `queryOrganization`  | `{orgId}`                          | `Organization`       |
//! | `queryPool`          | `{poolId}`                         | `AssetPool`          |
//! | `queryPoolIndex`     | `{poolId}`                         | `[AssetAddressIndex]`|
//! | `queryLogIndex`      | `{orgId}`                          | `[LogAddress]`       |
//! | `queryChainLog`      | `{txId}`                           | `ChainLog`           |
//! | `queryBalance`       | `{poolId, assetTypeId}` + transient| `{balance}`          |
//! | `queryAssetType`     | `{assetTypeId}`                    | `AssetInfo`          |
//!
//! A transfer's candidate source addresses travel in the invocation's
//! transient map, never in the arguments.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use tessera_protocol::config::ConfigError;
use tessera_protocol::ledger::{Invocation, LedgerBackend, LedgerTx};
use tessera_protocol::transaction::{
    AssetTypeRequest, IssueRequest, OrganizationRequest, PoolRequest, Signed, TransferRequest,
};
use tessera_protocol::{EngineConfig, EngineError, EngineResult, ErrorKind, Orchestrator};

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddOrganization,
    InitPool,
    RegisterAssetType,
    Issue,
    Transfer,
    QueryByAddress,
    QueryLogsByAddress,
    QueryOrganization,
    QueryPool,
    QueryPoolIndex,
    QueryLogIndex,
    QueryChainLog,
    QueryBalance,
    QueryAssetType,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::AddOrganization,
        Operation::InitPool,
        Operation::RegisterAssetType,
        Operation::Issue,
        Operation::Transfer,
        Operation::QueryByAddress,
        Operation::QueryLogsByAddress,
        Operation::QueryOrganization,
        Operation::QueryPool,
        Operation::QueryPoolIndex,
        Operation::QueryLogIndex,
        Operation::QueryChainLog,
        Operation::QueryBalance,
        Operation::QueryAssetType,
    ];

    /// The function name hosts invoke.
    pub fn name(self) -> &'static str {
        match self {
            Operation::AddOrganization => "addOrganization",
            Operation::InitPool => "initPool",
            Operation::RegisterAssetType => "registerAssetType",
            Operation::Issue => "issue",
            Operation::Transfer => "transfer",
            Operation::QueryByAddress => "queryByAddress",
            Operation::QueryLogsByAddress => "queryLogsByAddress",
            Operation::QueryOrganization => "queryOrganization",
            Operation::QueryPool => "queryPool",
            Operation::QueryPoolIndex => "queryPoolIndex",
            Operation::QueryLogIndex => "queryLogIndex",
            Operation::QueryChainLog => "queryChainLog",
            Operation::QueryBalance => "queryBalance",
            Operation::QueryAssetType => "queryAssetType",
        }
    }

    pub fn is_query(self) -> bool {
        !matches!(
            self,
            Operation::AddOrganization
                | Operation::InitPool
                | Operation::RegisterAssetType
                | Operation::Issue
                | Operation::Transfer
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| EngineError::Validation(format!("unknown function {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// What an invocation returns to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Response {
    Success { payload: Value },
    /// `message` is the full `KIND: message` string.
    Error { kind: ErrorKind, message: String },
}

impl Response {
    fn from_error(err: &EngineError) -> Self {
        Response::Error {
            kind: err.kind(),
            message: err.to_error_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Response::Success { payload } => Some(payload),
            Response::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Success { .. } => None,
            Response::Error { kind, .. } => Some(*kind),
        }
    }

    /// Deserialize the payload of a successful response.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        self.payload()
            .and_then(|payload| serde_json::from_value(payload.clone()).ok())
    }
}

// ---------------------------------------------------------------------------
// Query arguments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressArgs {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogIdsArgs {
    log_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgArgs {
    org_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolArgs {
    pool_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxArgs {
    tx_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetTypeArgs {
    asset_type_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceArgs {
    pool_id: String,
    asset_type_id: String,
}

/// Balances are `u128`; JSON carries them as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePayload {
    pub pool_id: String,
    pub asset_type_id: String,
    pub balance: String,
}

fn parse_args<T: DeserializeOwned>(op: Operation, args: &str) -> EngineResult<T> {
    serde_json::from_str(args)
        .map_err(|e| EngineError::Validation(format!("malformed {op} arguments: {e}")))
}

fn to_payload<T: Serialize>(value: &T) -> EngineResult<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::CorruptRecord {
        entity: "response",
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Chaincode
// ---------------------------------------------------------------------------

/// A ledger backend plus the engine configuration it runs under.
pub struct Chaincode<B: LedgerBackend> {
    backend: B,
    config: EngineConfig,
}

impl<B: LedgerBackend> Chaincode<B> {
    pub fn new(backend: B, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `function` with JSON `args`. Writes are committed only when the
    /// whole operation succeeds.
    pub fn invoke(&self, function: &str, args: &str, invocation: &Invocation) -> Response {
        match self.try_invoke(function, args, invocation) {
            Ok(payload) => Response::Success { payload },
            Err(err) => {
                debug!(function, tx_id = invocation.tx_id(), error = %err, "invocation failed");
                Response::from_error(&err)
            }
        }
    }

    fn try_invoke(&self, function: &str, args: &str, invocation: &Invocation) -> EngineResult<Value> {
        let op: Operation = function.parse()?;
        let orchestrator = Orchestrator::new(&self.config);
        let mut tx = LedgerTx::begin(&self.backend);

        let payload = match op {
            Operation::AddOrganization => {
                let request: Signed<OrganizationRequest> = parse_args(op, args)?;
                to_payload(&orchestrator.add_organization(&mut tx, invocation, &request)?)?
            }
            Operation::InitPool => {
                let request: Signed<PoolRequest> = parse_args(op, args)?;
                to_payload(&orchestrator.init_pool(&mut tx, invocation, &request)?)?
            }
            Operation::RegisterAssetType => {
                let request: Signed<AssetTypeRequest> = parse_args(op, args)?;
                to_payload(&orchestrator.register_asset_type(&mut tx, invocation, &request)?)?
            }
            Operation::Issue => {
                let request: Signed<IssueRequest> = parse_args(op, args)?;
                to_payload(&orchestrator.issue(&mut tx, invocation, &request)?)?
            }
            Operation::Transfer => {
                let request: Signed<TransferRequest> = parse_args(op, args)?;
                to_payload(&orchestrator.transfer(&mut tx, invocation, &request)?)?
            }
            Operation::QueryByAddress => {
                let a: AddressArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_asset(&mut tx, &a.address)?)?
            }
            Operation::QueryLogsByAddress => {
                let a: LogIdsArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_logs(&mut tx, &a.log_ids)?)?
            }
            Operation::QueryOrganization => {
                let a: OrgArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_organization(&mut tx, &a.org_id)?)?
            }
            Operation::QueryPool => {
                let a: PoolArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_pool(&mut tx, &a.pool_id)?)?
            }
            Operation::QueryPoolIndex => {
                let a: PoolArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_pool_index(&mut tx, &a.pool_id)?)?
            }
            Operation::QueryLogIndex => {
                let a: OrgArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_log_index(&mut tx, &a.org_id)?)?
            }
            Operation::QueryChainLog => {
                let a: TxArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_chain_log(&mut tx, &a.tx_id)?)?
            }
            Operation::QueryBalance => {
                let a: BalanceArgs = parse_args(op, args)?;
                let balance =
                    orchestrator.query_balance(&mut tx, invocation, &a.pool_id, &a.asset_type_id)?;
                to_payload(&BalancePayload {
                    pool_id: a.pool_id,
                    asset_type_id: a.asset_type_id,
                    balance: balance.to_string(),
                })?
            }
            Operation::QueryAssetType => {
                let a: AssetTypeArgs = parse_args(op, args)?;
                to_payload(&orchestrator.query_asset_type(&mut tx, &a.asset_type_id)?)?
            }
        };

        if op.is_query() {
            return Ok(payload);
        }
        let writes = tx.pending_writes();
        let sequence = tx.commit()?;
        info!(
            operation = op.name(),
            tx_id = invocation.tx_id(),
            writes,
            sequence = sequence.unwrap_or_default(),
            "invocation committed"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::MemoryLedger;

    fn chaincode() -> Chaincode<MemoryLedger> {
        Chaincode::new(MemoryLedger::new(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!(Operation::QueryBalance.is_query());
        assert!(Operation::QueryAssetType.is_query());
        assert!(!Operation::Transfer.is_query());
        assert!(!Operation::RegisterAssetType.is_query());
    }

    #[test]
    fn test_unknown_function_is_validation_error() {
        let response = chaincode().invoke("mint", "{}", &Invocation::new(b"c".to_vec()));
        assert_eq!(response.error_kind(), Some(ErrorKind::ValidationError));
        match response {
            Response::Error { message, .. } => {
                assert!(message.starts_with("VALIDATION_ERROR: "), "{message}");
            }
            Response::Success { .. } => panic!("expected an error"),
        }
    }

    #[test]
    fn test_malformed_args_rejected() {
        let response = chaincode().invoke("issue", "not json", &Invocation::new(b"c".to_vec()));
        assert_eq!(response.error_kind(), Some(ErrorKind::ValidationError));
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let response = chaincode().invoke(
            "queryByAddress",
            r#"{"address": "nowhere"}"#,
            &Invocation::new(b"c".to_vec()),
        );
        assert_eq!(response.error_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            max_candidates: 0,
            ..EngineConfig::default()
        };
        assert!(Chaincode::new(MemoryLedger::new(), config).is_err());
    }

    #[test]
    fn test_response_wire_shape() {
        let ok = Response::Success { payload: serde_json::json!({"a": 1}) };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "success", "payload": {"a": 1}})
        );
        let err = Response::Error {
            kind: ErrorKind::NotFound,
            message: "NOT_FOUND: asset \"x\" not found".into(),
        };
        assert_eq!(serde_json::to_value(&err).unwrap()["kind"], "NOT_FOUND");
    }
}
