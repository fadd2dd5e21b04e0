//! Payment handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::state::AppState;
use super::super::types::{ApiJson, ApiResult, PaymentListQuery, ok};
use super::parse_payment_id;
use crate::payment::Payment;
use crate::transfer::TransferRequest;

/// PUT /payment
///
/// Transfers funds between two accounts. Responds with the new payment id
/// as `text/plain`.
///
/// - 400: invalid request, including a body that does not parse
/// - 404: an account does not exist
/// - 409: an account row is locked by another operation (retryable)
/// - 422: insufficient withdrawal balance
/// - 500: internal failure, details only in the log
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TransferRequest>,
) -> ApiResult<String> {
    let payment_id = state.transfers.create_transfer(req).await?;
    Ok(payment_id.to_string())
}

/// GET /payment?accountId=&from=&to=
///
/// Payments touching the account, `from`/`to` inclusive, oldest first.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentListQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let filter = query.parse()?;
    let payments = state
        .payments
        .list(filter.account_id, filter.from, filter.to)
        .await?;
    ok(payments)
}

/// GET /payment/{id}
///
/// 200 + payment, 204 when it does not exist.
pub async fn read_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let payment_id = parse_payment_id(&id)?;
    match state.payments.get(payment_id).await? {
        Some(payment) => Ok(Json(payment).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
