//! Account CRUD handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::state::AppState;
use super::super::types::{ApiJson, ApiResult, ok};
use super::parse_account_id;
use crate::account::{Account, NewAccount, UpdateAccount};

/// PUT /account
///
/// 200 + created account, 400 on invalid fields.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewAccount>,
) -> ApiResult<Json<Account>> {
    let account = state.accounts.create(req).await?;
    ok(account)
}

/// GET /account/{id}
///
/// 200 + account, 204 when it does not exist.
pub async fn read_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let account_id = parse_account_id(&id)?;
    match state.accounts.get(account_id).await? {
        Some(account) => Ok(Json(account).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /account
///
/// 200 when updated, 304 when no such account, 409 when the row is locked.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateAccount>,
) -> ApiResult<StatusCode> {
    let updated = state.accounts.update(req).await?;
    Ok(modified_status(updated))
}

/// DELETE /account/{id}
///
/// 200 when deleted, 304 when no such account, 409 when the row is locked.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let account_id = parse_account_id(&id)?;
    let deleted = state.accounts.delete(account_id).await?;
    Ok(modified_status(deleted))
}

fn modified_status(changed: bool) -> StatusCode {
    if changed {
        StatusCode::OK
    } else {
        StatusCode::NOT_MODIFIED
    }
}
