//! # Engine Errors
//!
//! One error type for everything the engine can reject, with a stable
//! [`ErrorKind`] code per failure class. Hosts surface failures as
//! `"KIND: message"` strings (see [`EngineError::to_error_string`]), so the
//! codes are part of the external interface: never rename one.
//!
//! Lower layers keep their own error enums (`CryptoError`, `LedgerError`)
//! and are folded in with `#[from]`; `kind()` maps them to the right code.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::ledger::LedgerError;

/// Stable failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    SignatureInvalid,
    VerificationError,
    InvalidKeyFormat,
    NotFound,
    AlreadyExists,
    InsufficientBalance,
    InvalidAmount,
    EncryptionError,
    DecryptionError,
    StorageError,
    UnresolvedIdentity,
    Unauthorized,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::SignatureInvalid => "SIGNATURE_INVALID",
            ErrorKind::VerificationError => "VERIFICATION_ERROR",
            ErrorKind::InvalidKeyFormat => "INVALID_KEY_FORMAT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::EncryptionError => "ENCRYPTION_ERROR",
            ErrorKind::DecryptionError => "DECRYPTION_ERROR",
            ErrorKind::StorageError => "STORAGE_ERROR",
            ErrorKind::UnresolvedIdentity => "UNRESOLVED_IDENTITY",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Everything the engine can reject a request with.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    SignatureInvalid(String),

    #[error("{entity} {key:?} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} {key:?} already exists")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: u128, requested: u64 },

    #[error("{0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("corrupt {entity} record: {reason}")]
    CorruptRecord { entity: &'static str, reason: String },

    #[error("caller credential does not resolve to a registered organization")]
    UnresolvedIdentity,

    #[error("{0}")]
    Unauthorized(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::ValidationError,
            EngineError::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            EngineError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            EngineError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            EngineError::Crypto(CryptoError::InvalidKeyFormat(_)) => ErrorKind::InvalidKeyFormat,
            EngineError::Crypto(CryptoError::Encryption(_)) => ErrorKind::EncryptionError,
            EngineError::Crypto(CryptoError::Decryption) => ErrorKind::DecryptionError,
            EngineError::Crypto(CryptoError::Verification(_)) => ErrorKind::VerificationError,
            EngineError::Ledger(_) | EngineError::CorruptRecord { .. } => ErrorKind::StorageError,
            EngineError::UnresolvedIdentity => ErrorKind::UnresolvedIdentity,
            EngineError::Unauthorized(_) => ErrorKind::Unauthorized,
        }
    }

    /// `"KIND: message"`, the form hosts return to callers.
    pub fn to_error_string(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}
