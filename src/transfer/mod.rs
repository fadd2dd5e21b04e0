//! Funds transfer
//!
//! One payment is one store transaction:
//!
//! ```text
//! validate → begin → lock lower id → lock higher id → check funds
//!          → insert payment → debit → credit → commit
//!                  ↓ any failure
//!               rollback
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Global lock order**: rows are locked in ascending `AccountId` order
//!    no matter which side they play, so two transfers can never wait on
//!    each other in a cycle
//! 2. **Check under lock**: the funds check reads balances only after both
//!    row locks are held
//! 3. **All or nothing**: a payment row exists iff both balance updates
//!    committed with it
//! 4. **Exact row counts**: every write must touch exactly one row, anything
//!    else aborts as [`TransferError::InternalInconsistency`]

pub mod coordinator;
pub mod error;
pub mod types;

pub use coordinator::TransferCoordinator;
pub use error::TransferError;
pub use types::{TransferRequest, ValidatedTransfer, lock_order};
