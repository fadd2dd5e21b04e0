//! Transfer Error Types
//!
//! The failure taxonomy of a transfer. Callers match on the variant, never
//! on message text; only [`TransferError::LockConflict`] is worth retrying.

use thiserror::Error;

use crate::account::ValidationError;
use crate::core_types::{AccountId, AccountSide};
use crate::store::StoreError;

/// Transfer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Caller Errors ===
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{side} account not exists by accountId={account_id}")]
    NotFound {
        side: AccountSide,
        account_id: AccountId,
    },

    // === Business Rule ===
    #[error("Insufficient withdrawal balance")]
    InsufficientFunds { account_id: AccountId },

    // === Transient ===
    #[error(
        "{side} account with accountId={account_id} is temporary locked due to another payment or other operation"
    )]
    LockConflict {
        side: AccountSide,
        account_id: AccountId,
    },

    // === Fatal ===
    #[error("{0}")]
    InternalInconsistency(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl TransferError {
    /// Translate a row-lock failure on one leg
    pub fn from_lock(side: AccountSide, account_id: AccountId, e: StoreError) -> Self {
        match e {
            StoreError::LockTimeout => TransferError::LockConflict { side, account_id },
            other => TransferError::Store(other),
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "VALIDATION_FAILED",
            TransferError::NotFound { .. } => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::LockConflict { .. } => "LOCK_CONFLICT",
            TransferError::InternalInconsistency(_) => "INTERNAL_INCONSISTENCY",
            TransferError::Store(_) => "STORE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Validation(_) => 400,
            TransferError::NotFound { .. } => 404,
            TransferError::LockConflict { .. } => 409,
            TransferError::InsufficientFunds { .. } => 422,
            TransferError::InternalInconsistency(_) => 500,
            TransferError::Store(StoreError::Unavailable(_)) => 503,
            TransferError::Store(_) => 500,
        }
    }

    /// Only a lock conflict may succeed when tried again unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::LockConflict { .. })
    }

    /// Message safe to show a client. Internal failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            TransferError::InternalInconsistency(_) | TransferError::Store(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
