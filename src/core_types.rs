//! Core types used throughout the ledger
//!
//! Identifier newtypes shared by the store, the repositories and the
//! transfer coordinator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account ID - assigned by the store on creation, immutable afterwards.
///
/// # Ordering
/// `Ord` is the numeric order of the underlying value. The transfer
/// coordinator relies on it as the global lock-acquisition order, so it
/// must stay a plain integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    #[inline]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for AccountId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Payment ID - generated by the store when the payment row is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub i64);

impl PaymentId {
    #[inline]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PaymentId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Which leg of a payment an account plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSide {
    /// Debited account
    Withdrawal,
    /// Credited account
    Deposit,
}

impl AccountSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSide::Withdrawal => "Withdrawal",
            AccountSide::Deposit => "Deposit",
        }
    }
}

impl fmt::Display for AccountSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
