//! Transfer request types and lock ordering

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::validation::{
    FieldLimits, ValidationError, checked_not_null, checked_optional_text, checked_positive,
};
use crate::core_types::{AccountId, AccountSide};

/// Transfer request as parsed from the wire. Nothing is checked yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub amount: Option<Decimal>,
    pub withdrawal_account_id: Option<AccountId>,
    pub deposit_account_id: Option<AccountId>,
    pub comment: Option<String>,
}

impl TransferRequest {
    pub fn new(
        amount: Decimal,
        withdrawal_account_id: AccountId,
        deposit_account_id: AccountId,
        comment: Option<String>,
    ) -> Self {
        Self {
            amount: Some(amount),
            withdrawal_account_id: Some(withdrawal_account_id),
            deposit_account_id: Some(deposit_account_id),
            comment,
        }
    }

    /// Structural checks, in order: amount present and positive, both
    /// accounts present, comment length, accounts distinct.
    pub fn validate(self, limits: &FieldLimits) -> Result<ValidatedTransfer, ValidationError> {
        let amount = checked_not_null("payment.amount", self.amount)?;
        let amount = checked_positive("payment.amount", Some(amount))?;
        let withdrawal_account_id =
            checked_not_null("payment.withdrawalAccountId", self.withdrawal_account_id)?;
        let deposit_account_id =
            checked_not_null("payment.depositAccountId", self.deposit_account_id)?;
        let comment =
            checked_optional_text("payment.comment", self.comment, limits.comment_max_len)?;

        if withdrawal_account_id == deposit_account_id {
            return Err(ValidationError::SameAccount);
        }

        Ok(ValidatedTransfer {
            amount,
            withdrawal_account_id,
            deposit_account_id,
            comment,
        })
    }
}

/// A transfer that passed [`TransferRequest::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    amount: Decimal,
    withdrawal_account_id: AccountId,
    deposit_account_id: AccountId,
    comment: Option<String>,
}

impl ValidatedTransfer {
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn withdrawal_account_id(&self) -> AccountId {
        self.withdrawal_account_id
    }

    pub fn deposit_account_id(&self) -> AccountId {
        self.deposit_account_id
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn account(&self, side: AccountSide) -> AccountId {
        match side {
            AccountSide::Withdrawal => self.withdrawal_account_id,
            AccountSide::Deposit => self.deposit_account_id,
        }
    }

    /// Both legs in lock-acquisition order
    pub fn lock_order(&self) -> [(AccountSide, AccountId); 2] {
        lock_order(self.withdrawal_account_id, self.deposit_account_id)
    }
}

/// Lock-acquisition order for a pair of accounts: ascending by id,
/// whichever side each one plays.
pub fn lock_order(
    withdrawal: AccountId,
    deposit: AccountId,
) -> [(AccountSide, AccountId); 2] {
    let mut legs = [
        (AccountSide::Withdrawal, withdrawal),
        (AccountSide::Deposit, deposit),
    ];
    legs.sort_by_key(|(_, account_id)| *account_id);
    legs
}
