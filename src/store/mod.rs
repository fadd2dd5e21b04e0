//! Ledger Store capability
//!
//! The core never talks SQL directly. It sees the store through two object
//! safe traits:
//!
//! - [`LedgerStore`]: autocommit reads/inserts and transaction factory
//! - [`LedgerTx`]: one read-committed transaction holding exclusive row locks
//!   until [`LedgerTx::commit`] or [`LedgerTx::rollback`]
//!
//! Row-lock waits are bounded by the store's process-wide lock timeout; an
//! expired wait surfaces as [`StoreError::LockTimeout`].
//!
//! Implementations:
//! - [`memory::MemoryStore`]: in-process, deterministic contention and timeouts
//! - [`postgres::PgLedgerStore`]: PostgreSQL via `sqlx`, `SELECT ... FOR UPDATE`

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{Account, NewAccountRow};
use crate::core_types::{AccountId, PaymentId};
use crate::payment::{InsertedPayment, NewPaymentRow, Payment};

/// SQLSTATE raised when `lock_timeout` expires
pub const SQLSTATE_LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE raised when the server breaks a lock cycle
pub const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// Store backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Waiting for a row lock exceeded the configured timeout
    #[error("Row lock wait timed out")]
    LockTimeout,

    /// Any other backend failure (constraint, connection, decode)
    #[error("Database error: {0}")]
    Database(String),

    /// Store cannot be reached at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, StoreError::LockTimeout)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db)
                if matches!(
                    db.code().as_deref(),
                    Some(SQLSTATE_LOCK_NOT_AVAILABLE) | Some(SQLSTATE_DEADLOCK_DETECTED)
                ) =>
            {
                StoreError::LockTimeout
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Transactional store shared by every request worker
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Open a read-committed transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    /// Insert an account with zero balance, returning the stored row
    async fn insert_account(&self, row: NewAccountRow) -> Result<Account, StoreError>;

    /// Committed account by ID
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Committed payment by ID
    async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, StoreError>;

    /// Committed payments where `account_id` is either leg and
    /// `from <= processed <= to`, ordered by `processed` ascending
    async fn find_payments(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, StoreError>;

    /// Cheap liveness probe
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// One open store transaction
///
/// Dropping a transaction without committing discards its writes and
/// releases its locks.
#[async_trait]
pub trait LedgerTx: Send {
    /// Lock the account row exclusively and read its balance.
    ///
    /// Returns `Ok(None)` when no such account exists. Blocks up to the lock
    /// timeout when another transaction holds the row. Locking a row this
    /// transaction already holds returns immediately.
    async fn lock_account_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Decimal>, StoreError>;

    /// Set balance and `balance_last_modified`; returns rows affected
    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        modified: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Insert a payment, returning the generated ID and rows affected
    async fn insert_payment(&mut self, row: &NewPaymentRow)
    -> Result<InsertedPayment, StoreError>;

    /// Set owner name and comment; returns rows affected
    async fn update_account_details(
        &mut self,
        account_id: AccountId,
        owner_name: &str,
        comment: Option<&str>,
    ) -> Result<u64, StoreError>;

    /// Delete the account row; returns rows affected
    async fn delete_account(&mut self, account_id: AccountId) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
