//! PostgreSQL Ledger Store
//!
//! Row locks are real `SELECT ... FOR UPDATE` locks. Each transaction sets
//! `lock_timeout` locally, so a blocked lock fails with SQLSTATE `55P03`
//! instead of waiting forever; [`StoreError::from`] turns that into
//! [`StoreError::LockTimeout`].
//!
//! Isolation is the server default, read committed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{LedgerStore, LedgerTx, StoreError};
use crate::account::{Account, NewAccountRow};
use crate::core_types::{AccountId, PaymentId};
use crate::db::SafeRow;
use crate::payment::{InsertedPayment, NewPaymentRow, Payment};

const ACCOUNT_COLUMNS: &str =
    "account_id, created, owner_name, balance, balance_last_modified, comment";
const PAYMENT_COLUMNS: &str =
    "payment_id, processed, amount, withdrawal_account_id, deposit_account_id, comment";

/// PostgreSQL-backed store
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let missing = |column: &str| StoreError::Database(format!("column '{}' unreadable", column));
    Ok(Account {
        account_id: AccountId(row.try_get_log("account_id").ok_or_else(|| missing("account_id"))?),
        created: row.try_get_log("created").ok_or_else(|| missing("created"))?,
        owner_name: row.try_get_log("owner_name").ok_or_else(|| missing("owner_name"))?,
        balance: row.try_get_log("balance").ok_or_else(|| missing("balance"))?,
        balance_last_modified: row
            .try_get_log("balance_last_modified")
            .ok_or_else(|| missing("balance_last_modified"))?,
        comment: row.try_get_log("comment").ok_or_else(|| missing("comment"))?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment, StoreError> {
    let missing = |column: &str| StoreError::Database(format!("column '{}' unreadable", column));
    Ok(Payment {
        payment_id: PaymentId(row.try_get_log("payment_id").ok_or_else(|| missing("payment_id"))?),
        processed: row.try_get_log("processed").ok_or_else(|| missing("processed"))?,
        amount: row.try_get_log("amount").ok_or_else(|| missing("amount"))?,
        withdrawal_account_id: AccountId(
            row.try_get_log("withdrawal_account_id")
                .ok_or_else(|| missing("withdrawal_account_id"))?,
        ),
        deposit_account_id: AccountId(
            row.try_get_log("deposit_account_id")
                .ok_or_else(|| missing("deposit_account_id"))?,
        ),
        comment: row.try_get_log("comment").ok_or_else(|| missing("comment"))?,
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters; the value is an integer we own
        let set_timeout = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        );
        sqlx::query(&set_timeout).execute(&mut *tx).await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn insert_account(&self, row: NewAccountRow) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO account (created, owner_name, balance, balance_last_modified, comment)
             VALUES ($1, $2, 0, $1, $3)
             RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let inserted = sqlx::query(&sql)
            .bind(row.created)
            .bind(&row.owner_name)
            .bind(row.comment.as_deref())
            .fetch_one(&self.pool)
            .await?;
        account_from_row(&inserted)
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM account WHERE account_id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(account_id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let sql = format!("SELECT {} FROM payment WHERE payment_id = $1", PAYMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(payment_id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn find_payments(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, StoreError> {
        let sql = format!(
            "SELECT {} FROM payment
             WHERE processed BETWEEN $2 AND $3
               AND (withdrawal_account_id = $1 OR deposit_account_id = $1)
             ORDER BY processed, payment_id",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(account_id.value())
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One PostgreSQL transaction. Dropping it rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_account_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Decimal>, StoreError> {
        debug!(account_id = %account_id, "SELECT ... FOR UPDATE");
        let balance: Option<Decimal> = sqlx::query_scalar(
            "SELECT balance FROM account WHERE account_id = $1 FOR UPDATE",
        )
        .bind(account_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        modified: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE account SET balance = $2, balance_last_modified = $3 WHERE account_id = $1",
        )
        .bind(account_id.value())
        .bind(balance)
        .bind(modified)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_payment(
        &mut self,
        row: &NewPaymentRow,
    ) -> Result<InsertedPayment, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "INSERT INTO payment (processed, amount, withdrawal_account_id, deposit_account_id, comment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING payment_id",
        )
        .bind(row.processed)
        .bind(row.amount)
        .bind(row.withdrawal_account_id.value())
        .bind(row.deposit_account_id.value())
        .bind(row.comment.as_deref())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(InsertedPayment {
            payment_id: ids.first().copied().map(PaymentId),
            rows_affected: ids.len() as u64,
        })
    }

    async fn update_account_details(
        &mut self,
        account_id: AccountId,
        owner_name: &str,
        comment: Option<&str>,
    ) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE account SET owner_name = $2, comment = $3 WHERE account_id = $1")
                .bind(account_id.value())
                .bind(owner_name)
                .bind(comment)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete_account(&mut self, account_id: AccountId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM account WHERE account_id = $1")
            .bind(account_id.value())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
