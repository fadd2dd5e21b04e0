//! In-memory Ledger Store
//!
//! A process-local stand-in for the relational store with the same locking
//! discipline:
//!
//! - every account row owns a `tokio::sync::Mutex` acting as its exclusive
//!   row lock, acquired with a bounded wait (`lock_timeout`)
//! - a transaction buffers its writes and publishes them on commit under a
//!   write gate, so readers only ever observe committed state
//! - ID sequences are never rolled back, like database sequences
//!
//! Contention and timeouts are therefore reproducible in tests without a
//! database: hold a transaction that locked a row, then watch the next one
//! time out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::{LedgerStore, LedgerTx, StoreError};
use crate::account::{Account, NewAccountRow};
use crate::core_types::{AccountId, PaymentId};
use crate::payment::{InsertedPayment, NewPaymentRow, Payment};

struct Inner {
    rows: DashMap<AccountId, Account>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    payments: DashMap<PaymentId, Payment>,
    /// Commit publishes under the write side; committed reads take the read side
    publish: RwLock<()>,
    next_account_id: AtomicI64,
    next_payment_id: AtomicI64,
    lock_timeout: Duration,
}

/// In-memory store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store. Account IDs start at 0, payment IDs at 1.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                rows: DashMap::new(),
                row_locks: DashMap::new(),
                payments: DashMap::new(),
                publish: RwLock::new(()),
                next_account_id: AtomicI64::new(0),
                next_payment_id: AtomicI64::new(1),
                lock_timeout,
            }),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.inner.lock_timeout
    }

    /// Number of committed payments
    pub fn payment_count(&self) -> usize {
        self.inner.payments.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            inner: self.inner.clone(),
            held: HashMap::new(),
            balances: HashMap::new(),
            details: HashMap::new(),
            deleted: HashSet::new(),
            payments: Vec::new(),
        }))
    }

    async fn insert_account(&self, row: NewAccountRow) -> Result<Account, StoreError> {
        let account_id = AccountId(self.inner.next_account_id.fetch_add(1, Ordering::SeqCst));
        let account = Account {
            account_id,
            created: row.created,
            owner_name: row.owner_name,
            balance: Decimal::ZERO,
            balance_last_modified: row.created,
            comment: row.comment,
        };
        self.inner
            .row_locks
            .insert(account_id, Arc::new(Mutex::new(())));
        self.inner.rows.insert(account_id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let _read = self.inner.publish.read().await;
        Ok(self.inner.rows.get(&account_id).map(|r| r.value().clone()))
    }

    async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>, StoreError> {
        let _read = self.inner.publish.read().await;
        Ok(self.inner.payments.get(&payment_id).map(|p| p.value().clone()))
    }

    async fn find_payments(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, StoreError> {
        let _read = self.inner.publish.read().await;
        let mut found: Vec<Payment> = self
            .inner
            .payments
            .iter()
            .filter(|p| p.involves(account_id) && p.processed >= from && p.processed <= to)
            .map(|p| p.value().clone())
            .collect();
        found.sort_by(|a, b| {
            a.processed
                .cmp(&b.processed)
                .then(a.payment_id.cmp(&b.payment_id))
        });
        Ok(found)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One in-memory transaction
pub struct MemoryTx {
    inner: Arc<Inner>,
    /// Row locks held until commit/rollback/drop
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    balances: HashMap<AccountId, (Decimal, DateTime<Utc>)>,
    details: HashMap<AccountId, (String, Option<String>)>,
    deleted: HashSet<AccountId>,
    payments: Vec<Payment>,
}

impl MemoryTx {
    /// Take the row lock (bounded wait). Returns `false` when the row does
    /// not exist, in which case no lock is kept.
    async fn acquire(&mut self, account_id: AccountId) -> Result<bool, StoreError> {
        if self.held.contains_key(&account_id) {
            return Ok(!self.deleted.contains(&account_id));
        }

        let row_lock = match self.inner.row_locks.get(&account_id) {
            Some(lock) => lock.value().clone(),
            None => return Ok(false),
        };

        let guard = match tokio::time::timeout(self.inner.lock_timeout, row_lock.lock_owned()).await
        {
            Ok(guard) => guard,
            Err(_) => {
                debug!(account_id = %account_id, timeout_ms = self.inner.lock_timeout.as_millis() as u64, "Row lock wait timed out");
                return Err(StoreError::LockTimeout);
            }
        };

        // Deleted by the previous holder while we were waiting
        if !self.inner.rows.contains_key(&account_id) {
            return Ok(false);
        }

        self.held.insert(account_id, guard);
        Ok(true)
    }

    fn current_balance(&self, account_id: AccountId) -> Option<Decimal> {
        if let Some((balance, _)) = self.balances.get(&account_id) {
            return Some(*balance);
        }
        self.inner.rows.get(&account_id).map(|r| r.balance)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_account_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Decimal>, StoreError> {
        if !self.acquire(account_id).await? {
            return Ok(None);
        }
        Ok(self.current_balance(account_id))
    }

    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        modified: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if !self.acquire(account_id).await? {
            return Ok(0);
        }
        self.balances.insert(account_id, (balance, modified));
        Ok(1)
    }

    async fn insert_payment(
        &mut self,
        row: &NewPaymentRow,
    ) -> Result<InsertedPayment, StoreError> {
        let payment_id = PaymentId(self.inner.next_payment_id.fetch_add(1, Ordering::SeqCst));
        self.payments.push(row.clone().into_payment(payment_id));
        Ok(InsertedPayment {
            payment_id: Some(payment_id),
            rows_affected: 1,
        })
    }

    async fn update_account_details(
        &mut self,
        account_id: AccountId,
        owner_name: &str,
        comment: Option<&str>,
    ) -> Result<u64, StoreError> {
        if !self.acquire(account_id).await? {
            return Ok(0);
        }
        self.details.insert(
            account_id,
            (owner_name.to_string(), comment.map(str::to_string)),
        );
        Ok(1)
    }

    async fn delete_account(&mut self, account_id: AccountId) -> Result<u64, StoreError> {
        if !self.acquire(account_id).await? {
            return Ok(0);
        }
        self.deleted.insert(account_id);
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let inner = this.inner.clone();
        let _write = inner.publish.write().await;

        for (account_id, (balance, modified)) in this.balances {
            if let Some(mut row) = inner.rows.get_mut(&account_id) {
                row.balance = balance;
                row.balance_last_modified = modified;
            }
        }
        for (account_id, (owner_name, comment)) in this.details {
            if let Some(mut row) = inner.rows.get_mut(&account_id) {
                row.owner_name = owner_name;
                row.comment = comment;
            }
        }
        for account_id in this.deleted {
            inner.rows.remove(&account_id);
            inner.row_locks.remove(&account_id);
        }
        for payment in this.payments {
            inner.payments.insert(payment.payment_id, payment);
        }

        // Row locks are released only after everything is published
        drop(this.held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
