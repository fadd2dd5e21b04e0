//! Data models for bank accounts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::AccountId;

/// Committed account row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: AccountId,
    pub created: DateTime<Utc>,
    pub owner_name: String,
    pub balance: Decimal,
    /// Updated exactly when `balance` changes
    pub balance_last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Account creation request, as parsed from the wire (fields unchecked)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub owner_name: Option<String>,
    pub comment: Option<String>,
}

/// Owner/comment update request, as parsed from the wire (fields unchecked)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
    pub account_id: Option<AccountId>,
    pub owner_name: Option<String>,
    pub comment: Option<String>,
}

/// Validated insert for the store; balance always starts at zero
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub owner_name: String,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
}
