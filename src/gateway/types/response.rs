//! API error envelope and error codes

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::account::{AccountError, ValidationError};
use crate::payment::PaymentQueryError;
use crate::store::StoreError;
use crate::transfer::TransferError;

// ============================================================================
// Error Envelope
// ============================================================================

/// Error body: `{"code": "...", "msg": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

/// Handler error, rendered as status + [`ErrorBody`]
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Wrap a payload as a `200 OK` JSON response
pub fn ok<T: Serialize>(data: T) -> ApiResult<Json<T>> {
    Ok(Json(data))
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, error_codes::LOCK_CONFLICT, msg)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "Internal server error",
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.to_string(),
            msg: self.msg,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Domain Error Mapping
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "Store failure");
        match e {
            StoreError::Unavailable(_) => ApiError::service_unavailable("Store unavailable"),
            _ => ApiError::internal(),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status = StatusCode::from_u16(e.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, e.code(), e.public_message())
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(v) => v.into(),
            AccountError::LockConflict { .. } => ApiError::conflict(e.to_string()),
            AccountError::Store(s) => s.into(),
        }
    }
}

impl From<PaymentQueryError> for ApiError {
    fn from(e: PaymentQueryError) -> Self {
        match e {
            PaymentQueryError::Validation(v) => v.into(),
            PaymentQueryError::Store(s) => s.into(),
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Gateway-level error codes. Transfer failures use
/// [`TransferError::code`] instead.
pub mod error_codes {
    pub const INVALID_PARAMETER: &str = "INVALID_PARAMETER";
    pub const LOCK_CONFLICT: &str = "LOCK_CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}
