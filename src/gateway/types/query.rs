//! Payment listing query string

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::response::ApiError;
use crate::core_types::AccountId;

/// `GET /payment?accountId=2&from=2020-02-02T00:00:00.000&to=...`
///
/// Kept as raw strings so a malformed value yields our own 400 message
/// instead of the extractor's rejection text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    pub account_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Parsed listing filter, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentListFilter {
    pub account_id: AccountId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl PaymentListQuery {
    pub fn parse(&self) -> Result<PaymentListFilter, ApiError> {
        let account_id = required("accountId", self.account_id.as_deref())?
            .parse::<AccountId>()
            .map_err(|_| ApiError::bad_request("'accountId' must be an integer"))?;
        let from = parse_timestamp("from", required("from", self.from.as_deref())?)?;
        let to = parse_timestamp("to", required("to", self.to.as_deref())?)?;
        Ok(PaymentListFilter {
            account_id,
            from,
            to,
        })
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(ApiError::bad_request(format!("'{}' is undefined", name))),
    }
}

/// RFC 3339, or a zone-less date-time taken as UTC
pub fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ApiError::bad_request(format!("'{}' is not a valid date-time", name)))
}
