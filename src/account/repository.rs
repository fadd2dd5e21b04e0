//! Account repository: CRUD over the Ledger Store
//!
//! Every mutation of an existing row runs in its own store transaction and
//! takes the row lock first, so it waits behind (and times out against) an
//! in-flight transfer exactly like another transfer would.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use super::models::{Account, NewAccount, NewAccountRow, UpdateAccount};
use super::validation::{
    FieldLimits, ValidationError, checked_not_null, checked_optional_text, checked_required_text,
};
use crate::core_types::AccountId;
use crate::store::{LedgerStore, LedgerTx, StoreError};

/// Account CRUD errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "Account with accountId={account_id} is temporary locked due to another payment or other operation"
    )]
    LockConflict { account_id: AccountId },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl AccountError {
    fn from_store(account_id: AccountId, e: StoreError) -> Self {
        match e {
            StoreError::LockTimeout => AccountError::LockConflict { account_id },
            other => AccountError::Store(other),
        }
    }
}

/// Account CRUD
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn LedgerStore>,
    limits: FieldLimits,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn LedgerStore>, limits: FieldLimits) -> Self {
        Self { store, limits }
    }

    /// Create an account with zero balance
    pub async fn create(&self, req: NewAccount) -> Result<Account, AccountError> {
        let row = NewAccountRow {
            owner_name: checked_required_text(
                "account.ownerName",
                req.owner_name,
                self.limits.owner_name_max_len,
            )?,
            comment: checked_optional_text(
                "account.comment",
                req.comment,
                self.limits.comment_max_len,
            )?,
            created: Utc::now(),
        };

        let account = self
            .store
            .insert_account(row)
            .await
            .map_err(AccountError::Store)?;
        info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }

    /// Committed account, `None` when absent
    pub async fn get(&self, account_id: AccountId) -> Result<Option<Account>, AccountError> {
        self.store
            .get_account(account_id)
            .await
            .map_err(AccountError::Store)
    }

    /// Update owner name and comment. Returns `false` when no such account.
    pub async fn update(&self, req: UpdateAccount) -> Result<bool, AccountError> {
        let owner_name = checked_required_text(
            "account.ownerName",
            req.owner_name,
            self.limits.owner_name_max_len,
        )?;
        let comment =
            checked_optional_text("account.comment", req.comment, self.limits.comment_max_len)?;
        let account_id = checked_not_null("account.accountId", req.account_id)?;

        let mut tx = self.begin(account_id).await?;
        let rows = tx
            .update_account_details(account_id, &owner_name, comment.as_deref())
            .await;
        let updated = self.finish(tx, account_id, rows).await?;
        if updated {
            info!(account_id = %account_id, "Account updated");
        }
        Ok(updated)
    }

    /// Delete an account. Returns `false` when no such account.
    pub async fn delete(&self, account_id: AccountId) -> Result<bool, AccountError> {
        let mut tx = self.begin(account_id).await?;
        let rows = tx.delete_account(account_id).await;
        let deleted = self.finish(tx, account_id, rows).await?;
        if deleted {
            info!(account_id = %account_id, "Account deleted");
        }
        Ok(deleted)
    }

    /// Administrative balance overwrite (seeding, corrections).
    ///
    /// Locks the row, then writes `balance` and `balance_last_modified`.
    /// Returns `false` when no such account.
    pub async fn set_balance(
        &self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<bool, AccountError> {
        if balance < Decimal::ZERO {
            return Err(ValidationError::Negative {
                field: "account.balance",
            }
            .into());
        }

        let mut tx = self.begin(account_id).await?;
        let rows = match tx.lock_account_for_update(account_id).await {
            Ok(Some(_)) => tx.update_balance(account_id, balance, Utc::now()).await,
            Ok(None) => Ok(0),
            Err(e) => Err(e),
        };
        let updated = self.finish(tx, account_id, rows).await?;
        if updated {
            info!(account_id = %account_id, balance = %balance, "Account balance set");
        }
        Ok(updated)
    }

    async fn begin(&self, account_id: AccountId) -> Result<Box<dyn LedgerTx>, AccountError> {
        self.store
            .begin()
            .await
            .map_err(|e| AccountError::from_store(account_id, e))
    }

    /// Commit when exactly one row was touched, roll back otherwise
    async fn finish(
        &self,
        tx: Box<dyn LedgerTx>,
        account_id: AccountId,
        rows: Result<u64, StoreError>,
    ) -> Result<bool, AccountError> {
        match rows {
            Ok(1) => {
                tx.commit()
                    .await
                    .map_err(|e| AccountError::from_store(account_id, e))?;
                Ok(true)
            }
            Ok(_) => {
                if let Err(e) = tx.rollback().await {
                    warn!(account_id = %account_id, error = %e, "Rollback failed");
                }
                Ok(false)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(account_id = %account_id, error = %rb, "Rollback failed");
                }
                if e.is_lock_timeout() {
                    warn!(account_id = %account_id, "Account is locked by another operation");
                }
                Err(AccountError::from_store(account_id, e))
            }
        }
    }
}
