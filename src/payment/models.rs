//! Data models for payments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, PaymentId};

/// Committed payment row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: PaymentId,
    /// Transaction start time, shared with both balance updates
    pub processed: DateTime<Utc>,
    pub amount: Decimal,
    pub withdrawal_account_id: AccountId,
    pub deposit_account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Payment insert, built by the transfer coordinator from a validated request
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentRow {
    pub processed: DateTime<Utc>,
    pub amount: Decimal,
    pub withdrawal_account_id: AccountId,
    pub deposit_account_id: AccountId,
    pub comment: Option<String>,
}

impl NewPaymentRow {
    pub fn into_payment(self, payment_id: PaymentId) -> Payment {
        Payment {
            payment_id,
            processed: self.processed,
            amount: self.amount,
            withdrawal_account_id: self.withdrawal_account_id,
            deposit_account_id: self.deposit_account_id,
            comment: self.comment,
        }
    }
}

/// Result of `INSERT ... RETURNING payment_id`
///
/// `payment_id` is `None` when no row came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedPayment {
    pub payment_id: Option<PaymentId>,
    pub rows_affected: u64,
}

impl Payment {
    /// Whether `account_id` is either leg of this payment
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.withdrawal_account_id == account_id || self.deposit_account_id == account_id
    }
}
