//! HTTP handlers
//!
//! Handlers only parse, call one repository/coordinator operation and map
//! the outcome to a status code.

pub mod account;
pub mod health;
pub mod payment;

pub use account::{create_account, delete_account, read_account, update_account};
pub use health::health_check;
pub use payment::{create_payment, list_payments, read_payment};

use super::types::ApiError;
use crate::core_types::{AccountId, PaymentId};

fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid account id '{}'", raw)))
}

fn parse_payment_id(raw: &str) -> Result<PaymentId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(PaymentId)
        .map_err(|_| ApiError::bad_request(format!("Invalid payment id '{}'", raw)))
}
