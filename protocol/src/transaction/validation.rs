//! Shape checks run before anything touches the ledger.

use crate::config::{EngineConfig, PART_SEPARATOR};
use crate::error::{EngineError, EngineResult};
use crate::ledger::Invocation;
use crate::pool::CandidateRef;

/// A required identifier: non-blank and free of the key separator.
pub fn require(field: &str, value: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(EngineError::validation(format!("{field} is required")));
    }
    if value.contains(PART_SEPARATOR) {
        return Err(EngineError::validation(format!(
            "{field} contains a NUL character"
        )));
    }
    Ok(())
}

/// `amount > 0` (or `>= 0` when `allow_zero`), as a `u64`.
pub fn check_amount(amount: i64, allow_zero: bool) -> EngineResult<u64> {
    if amount < 0 || (amount == 0 && !allow_zero) {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    u64::try_from(amount)
        .map_err(|_| EngineError::InvalidAmount(format!("amount {amount} out of range")))
}

/// A new asset address: required, and short enough to seal into the pool
/// index.
pub fn check_address(config: &EngineConfig, field: &str, address: &str) -> EngineResult<()> {
    require(field, address)?;
    if address.len() > config.max_sealed_plaintext {
        return Err(EngineError::validation(format!(
            "{field} is {} bytes, limit is {}",
            address.len(),
            config.max_sealed_plaintext
        )));
    }
    Ok(())
}

/// Optional free text (`logInfo`, `modUser`), bounded by `max_log_info_len`.
pub fn check_free_text(config: &EngineConfig, field: &str, text: &str) -> EngineResult<()> {
    if text.len() > config.max_log_info_len {
        return Err(EngineError::validation(format!(
            "{field} is {} bytes, limit is {}",
            text.len(),
            config.max_log_info_len
        )));
    }
    Ok(())
}

/// Candidate source addresses from the transient side channel.
///
/// An absent entry means no candidates (the transfer will then be
/// unfundable). A present but unparseable entry is a validation failure.
pub fn candidates_from_transient(
    config: &EngineConfig,
    invocation: &Invocation,
) -> EngineResult<Vec<CandidateRef>> {
    match invocation.transient(&config.schema.candidates_key) {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_slice(raw).map_err(|e| {
            EngineError::validation(format!(
                "transient {:?} is not a candidate list: {e}",
                config.schema.candidates_key
            ))
        }),
    }
}
