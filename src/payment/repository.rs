//! Payment read side

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::Payment;
use crate::account::ValidationError;
use crate::core_types::{AccountId, PaymentId};
use crate::store::{LedgerStore, StoreError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentQueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Reads committed payments
#[derive(Clone)]
pub struct PaymentRepository {
    store: Arc<dyn LedgerStore>,
}

impl PaymentRepository {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>, PaymentQueryError> {
        Ok(self.store.get_payment(payment_id).await?)
    }

    /// Payments where `account_id` is either leg, `from <= processed <= to`,
    /// oldest first.
    pub async fn list(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Payment>, PaymentQueryError> {
        if from > to {
            return Err(ValidationError::InvalidInterval.into());
        }
        Ok(self.store.find_payments(account_id, from, to).await?)
    }
}
