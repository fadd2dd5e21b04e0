//! Gateway request/response types
//!
//! - `ApiError` / `ApiResult`: error envelope and handler result
//! - `ApiJson`: JSON body extractor rejecting with the same envelope
//! - `PaymentListQuery`: listing query string, parsed into typed bounds

pub mod json;
pub mod query;
pub mod response;

pub use json::ApiJson;
pub use query::{PaymentListFilter, PaymentListQuery};
pub use response::{ApiError, ApiResult, ErrorBody, error_codes, ok};
