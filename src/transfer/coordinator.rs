//! Transfer Coordinator
//!
//! Executes one payment as a single store transaction. The coordinator holds
//! no mutable state of its own; every bit of mutual exclusion comes from the
//! store's row locks, taken in [`lock_order`](super::types::lock_order).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::types::{TransferRequest, ValidatedTransfer};
use crate::account::FieldLimits;
use crate::core_types::{AccountSide, PaymentId};
use crate::payment::{InsertedPayment, NewPaymentRow};
use crate::store::{LedgerStore, LedgerTx};

/// Transfer Coordinator - one payment, one transaction
#[derive(Clone)]
pub struct TransferCoordinator {
    store: Arc<dyn LedgerStore>,
    limits: FieldLimits,
}

impl TransferCoordinator {
    pub fn new(store: Arc<dyn LedgerStore>, limits: FieldLimits) -> Self {
        Self { store, limits }
    }

    /// Validate and execute a transfer request.
    ///
    /// Validation failures return before the store is touched.
    pub async fn create_transfer(&self, req: TransferRequest) -> Result<PaymentId, TransferError> {
        let transfer = req.validate(&self.limits)?;
        self.execute(&transfer).await
    }

    /// Execute an already validated transfer.
    ///
    /// Commits exactly one payment row and two balance updates, or nothing.
    pub async fn execute(&self, transfer: &ValidatedTransfer) -> Result<PaymentId, TransferError> {
        // Shared by the payment row and both balance updates
        let processed = Utc::now();

        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!(error = %e, ?transfer, "Transfer aborted: begin failed");
                return Err(TransferError::Store(e));
            }
        };

        match apply(tx.as_mut(), transfer, processed).await {
            Ok(payment_id) => {
                if let Err(e) = tx.commit().await {
                    error!(error = %e, payment_id = %payment_id, ?transfer, "Transfer aborted: commit failed");
                    return Err(TransferError::Store(e));
                }
                info!(
                    payment_id = %payment_id,
                    withdrawal_account_id = %transfer.withdrawal_account_id(),
                    deposit_account_id = %transfer.deposit_account_id(),
                    amount = %transfer.amount(),
                    "Payment committed"
                );
                Ok(payment_id)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "Transfer rollback failed");
                }
                match &e {
                    TransferError::LockConflict { side, account_id } => {
                        warn!(side = %side, account_id = %account_id, "Transfer aborted: row lock wait timed out");
                    }
                    TransferError::InternalInconsistency(_) | TransferError::Store(_) => {
                        error!(error = %e, ?transfer, "Transfer aborted");
                    }
                    _ => {
                        debug!(error = %e, "Transfer rejected");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Transaction body. The caller owns commit/rollback.
async fn apply(
    tx: &mut dyn LedgerTx,
    transfer: &ValidatedTransfer,
    processed: DateTime<Utc>,
) -> Result<PaymentId, TransferError> {
    // Step 1-2: lock both rows, lower id first
    let mut withdrawal_balance = None;
    let mut deposit_balance = None;
    for (side, account_id) in transfer.lock_order() {
        let balance = tx
            .lock_account_for_update(account_id)
            .await
            .map_err(|e| TransferError::from_lock(side, account_id, e))?
            .ok_or(TransferError::NotFound { side, account_id })?;
        debug!(side = %side, account_id = %account_id, "Row locked");
        match side {
            AccountSide::Withdrawal => withdrawal_balance = Some(balance),
            AccountSide::Deposit => deposit_balance = Some(balance),
        }
    }
    let (Some(withdrawal_balance), Some(deposit_balance)) = (withdrawal_balance, deposit_balance)
    else {
        return Err(TransferError::InternalInconsistency(
            "Lock order did not cover both accounts".into(),
        ));
    };

    // Step 3: funds check, both locks held
    let amount = transfer.amount();
    if withdrawal_balance < amount {
        return Err(TransferError::InsufficientFunds {
            account_id: transfer.withdrawal_account_id(),
        });
    }

    // Step 4: payment row
    let inserted = tx
        .insert_payment(&NewPaymentRow {
            processed,
            amount,
            withdrawal_account_id: transfer.withdrawal_account_id(),
            deposit_account_id: transfer.deposit_account_id(),
            comment: transfer.comment().map(str::to_string),
        })
        .await
        .map_err(TransferError::Store)?;
    let payment_id = match inserted {
        InsertedPayment {
            rows_affected: 1,
            payment_id: Some(payment_id),
        } => payment_id,
        _ => {
            error!(
                rows_affected = inserted.rows_affected,
                payment_id = ?inserted.payment_id,
                "Payment insert affected unexpected row count"
            );
            return Err(TransferError::InternalInconsistency(
                "Can't create payment record".into(),
            ));
        }
    };

    // Step 5: debit, then credit
    let new_withdrawal = withdrawal_balance - amount;
    let new_deposit = deposit_balance.checked_add(amount).ok_or_else(|| {
        TransferError::InternalInconsistency("Deposit balance overflow".into())
    })?;
    update_leg(tx, transfer, AccountSide::Withdrawal, new_withdrawal, processed).await?;
    update_leg(tx, transfer, AccountSide::Deposit, new_deposit, processed).await?;

    Ok(payment_id)
}

async fn update_leg(
    tx: &mut dyn LedgerTx,
    transfer: &ValidatedTransfer,
    side: AccountSide,
    balance: Decimal,
    processed: DateTime<Utc>,
) -> Result<(), TransferError> {
    let account_id = transfer.account(side);
    let rows = tx
        .update_balance(account_id, balance, processed)
        .await
        .map_err(|e| TransferError::from_lock(side, account_id, e))?;
    if rows != 1 {
        error!(
            side = %side,
            account_id = %account_id,
            rows_affected = rows,
            "Balance update affected unexpected row count"
        );
        return Err(TransferError::InternalInconsistency(format!(
            "Can't update balance of {} account",
            side.as_str().to_lowercase()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, NewAccountRow};
    use crate::core_types::AccountId;
    use crate::payment::Payment;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ========================================================================
    // Scripted store: fixed answers, records every call
    // ========================================================================

    #[derive(Default)]
    struct Script {
        balances: HashMap<AccountId, Decimal>,
        locked: Vec<AccountId>,
        insert_rows: Option<u64>,
        insert_without_id: bool,
        update_rows: HashMap<AccountId, u64>,
        begin_fails: bool,
        commit_fails: bool,
    }

    #[derive(Default)]
    struct Journal {
        calls: Vec<String>,
        updates: Vec<(AccountId, Decimal, DateTime<Utc>)>,
        inserted: Vec<NewPaymentRow>,
    }

    #[derive(Clone, Default)]
    struct ScriptedStore {
        script: Arc<Script>,
        journal: Arc<Mutex<Journal>>,
    }

    impl ScriptedStore {
        fn with(script: Script) -> Self {
            Self {
                script: Arc::new(script),
                journal: Arc::default(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.journal.lock().unwrap().calls.clone()
        }
    }

    struct ScriptedTx {
        script: Arc<Script>,
        journal: Arc<Mutex<Journal>>,
    }

    impl ScriptedTx {
        fn record(&self, call: String) {
            self.journal.lock().unwrap().calls.push(call);
        }
    }

    #[async_trait]
    impl LedgerStore for ScriptedStore {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
            if self.script.begin_fails {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            Ok(Box::new(ScriptedTx {
                script: self.script.clone(),
                journal: self.journal.clone(),
            }))
        }

        async fn insert_account(&self, _row: NewAccountRow) -> Result<Account, StoreError> {
            Err(StoreError::Database("not scripted".into()))
        }

        async fn get_account(&self, _id: AccountId) -> Result<Option<Account>, StoreError> {
            Ok(None)
        }

        async fn get_payment(&self, _id: PaymentId) -> Result<Option<Payment>, StoreError> {
            Ok(None)
        }

        async fn find_payments(
            &self,
            _account_id: AccountId,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<Payment>, StoreError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[async_trait]
    impl LedgerTx for ScriptedTx {
        async fn lock_account_for_update(
            &mut self,
            account_id: AccountId,
        ) -> Result<Option<Decimal>, StoreError> {
            self.record(format!("lock {}", account_id));
            if self.script.locked.contains(&account_id) {
                return Err(StoreError::LockTimeout);
            }
            Ok(self.script.balances.get(&account_id).copied())
        }

        async fn update_balance(
            &mut self,
            account_id: AccountId,
            balance: Decimal,
            modified: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            self.record(format!("update {}", account_id));
            self.journal
                .lock()
                .unwrap()
                .updates
                .push((account_id, balance, modified));
            Ok(*self.script.update_rows.get(&account_id).unwrap_or(&1))
        }

        async fn insert_payment(
            &mut self,
            row: &NewPaymentRow,
        ) -> Result<InsertedPayment, StoreError> {
            self.record("insert".into());
            self.journal.lock().unwrap().inserted.push(row.clone());
            let rows_affected = self.script.insert_rows.unwrap_or(1);
            Ok(InsertedPayment {
                payment_id: (rows_affected > 0 && !self.script.insert_without_id)
                    .then_some(PaymentId(77)),
                rows_affected,
            })
        }

        async fn update_account_details(
            &mut self,
            _account_id: AccountId,
            _owner_name: &str,
            _comment: Option<&str>,
        ) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn delete_account(&mut self, _account_id: AccountId) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn commit(self: Box<Self>) -> Result<(), StoreError> {
            self.record("commit".into());
            if self.script.commit_fails {
                return Err(StoreError::Database("could not serialize access".into()));
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
            self.record("rollback".into());
            Ok(())
        }
    }

    fn funded(pairs: &[(i64, Decimal)]) -> Script {
        Script {
            balances: pairs.iter().map(|(id, b)| (AccountId(*id), *b)).collect(),
            ..Default::default()
        }
    }

    fn coordinator(store: &ScriptedStore) -> TransferCoordinator {
        TransferCoordinator::new(Arc::new(store.clone()), FieldLimits::default())
    }

    fn request(amount: Decimal, withdrawal: i64, deposit: i64) -> TransferRequest {
        TransferRequest::new(amount, AccountId(withdrawal), AccountId(deposit), None)
    }

    // ========================================================================
    // Tests
    // ========================================================================

    #[tokio::test]
    async fn test_success_runs_steps_in_order() {
        let store = ScriptedStore::with(funded(&[(5, dec!(100)), (1, dec!(0))]));
        let payment_id = coordinator(&store)
            .create_transfer(request(dec!(40), 5, 1))
            .await
            .unwrap();

        assert_eq!(payment_id, PaymentId(77));
        assert_eq!(
            store.calls(),
            vec!["lock 1", "lock 5", "insert", "update 5", "update 1", "commit"]
        );

        let journal = store.journal.lock().unwrap();
        let processed = journal.inserted[0].processed;
        assert_eq!(
            journal.updates,
            vec![
                (AccountId(5), dec!(60), processed),
                (AccountId(1), dec!(40), processed)
            ]
        );
    }

    #[tokio::test]
    async fn test_lock_order_independent_of_direction() {
        let store = ScriptedStore::with(funded(&[(5, dec!(100)), (1, dec!(100))]));
        coordinator(&store)
            .create_transfer(request(dec!(1), 1, 5))
            .await
            .unwrap();
        assert_eq!(&store.calls()[..2], &["lock 1", "lock 5"]);
    }

    #[tokio::test]
    async fn test_validation_never_touches_store() {
        let store = ScriptedStore::with(funded(&[(1, dec!(100))]));
        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_account_reports_side() {
        let store = ScriptedStore::with(funded(&[(1, dec!(100))]));
        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 3))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::NotFound {
                side: AccountSide::Deposit,
                account_id: AccountId(3)
            }
        );
        assert_eq!(store.calls(), vec!["lock 1", "lock 3", "rollback"]);
    }

    #[tokio::test]
    async fn test_insufficient_funds_writes_nothing() {
        let store = ScriptedStore::with(funded(&[(0, dec!(9999.99)), (2, dec!(0))]));
        let err = coordinator(&store)
            .create_transfer(request(dec!(10000), 0, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientFunds {
                account_id: AccountId(0)
            }
        );
        assert_eq!(store.calls(), vec!["lock 0", "lock 2", "rollback"]);
    }

    #[tokio::test]
    async fn test_exact_balance_is_sufficient() {
        let store = ScriptedStore::with(funded(&[(0, dec!(10000)), (2, dec!(0))]));
        coordinator(&store)
            .create_transfer(request(dec!(10000), 0, 2))
            .await
            .unwrap();
        assert_eq!(
            store.journal.lock().unwrap().updates[0].1,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_lock_timeout_is_lock_conflict() {
        let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
        script.locked.push(AccountId(2));
        let store = ScriptedStore::with(script);

        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::LockConflict {
                side: AccountSide::Deposit,
                account_id: AccountId(2)
            }
        );
        assert!(err.is_retryable());
        assert_eq!(store.calls(), vec!["lock 1", "lock 2", "rollback"]);
    }

    #[tokio::test]
    async fn test_insert_row_count_mismatch_is_fatal() {
        for rows in [0, 2] {
            let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
            script.insert_rows = Some(rows);
            let store = ScriptedStore::with(script);

            let err = coordinator(&store)
                .create_transfer(request(dec!(1), 1, 2))
                .await
                .unwrap_err();
            assert_eq!(
                err,
                TransferError::InternalInconsistency("Can't create payment record".into())
            );
            assert!(!err.is_retryable());
            assert_eq!(store.calls(), vec!["lock 1", "lock 2", "insert", "rollback"]);
        }
    }

    #[tokio::test]
    async fn test_update_row_count_mismatch_is_fatal() {
        let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
        script.update_rows.insert(AccountId(2), 0);
        let store = ScriptedStore::with(script);

        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InternalInconsistency("Can't update balance of deposit account".into())
        );
        assert_eq!(
            store.calls(),
            vec!["lock 1", "lock 2", "insert", "update 1", "update 2", "rollback"]
        );
    }

    #[tokio::test]
    async fn test_insert_without_returned_id_is_fatal() {
        let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
        script.insert_without_id = true;
        let store = ScriptedStore::with(script);

        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransferError::InternalInconsistency("Can't create payment record".into())
        );
        assert_eq!(store.calls(), vec!["lock 1", "lock 2", "insert", "rollback"]);
        assert!(store.journal.lock().unwrap().updates.is_empty());
    }

    #[tokio::test]
    async fn test_begin_failure_is_store_error() {
        let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
        script.begin_fails = true;
        let store = ScriptedStore::with(script);

        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.http_status(), 503);
        assert!(!err.is_retryable());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_is_store_error() {
        let mut script = funded(&[(1, dec!(100)), (2, dec!(100))]);
        script.commit_fails = true;
        let store = ScriptedStore::with(script);

        let err = coordinator(&store)
            .create_transfer(request(dec!(1), 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Store(StoreError::Database(_))));
        assert_eq!(err.http_status(), 500);
        assert_eq!(
            store.calls(),
            vec!["lock 1", "lock 2", "insert", "update 1", "update 2", "commit"]
        );
    }
}
