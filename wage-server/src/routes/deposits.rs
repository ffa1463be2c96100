//! Deposit endpoints
//!
//! `POST /deposits` drives the whole funding pipeline; the other handlers
//! are record keeping around it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use super::{error, Identity};
use crate::chain::abi;
use crate::services::DepositError;
use crate::state::AppState;
use crate::types::{DepositListQuery, DepositRequest, DepositUpdateRequest, ErrorCode};

/// Create deposit routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deposits", get(list_deposits).post(create_deposit))
        .route("/deposits/:id", patch(update_deposit))
}

/// Run the funding pipeline for a wage group
/// POST /api/v1/deposits
async fn create_deposit(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<DepositRequest>,
) -> Response {
    if !abi::is_address(&request.address) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Invalid wallet address",
        )
        .into_response();
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Amount must be greater than 0",
        )
        .into_response();
    }

    let Some(group) = state
        .store()
        .get_wage_group(identity.0.id, request.wage_group_id)
        .await
    else {
        return error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            "Wage group not found",
        )
        .into_response();
    };

    let Some(yield_source) = group.yield_source.clone() else {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Wage group has no yield source",
        )
        .into_response();
    };
    let Some(vault_address) = state.config().vault_address(&yield_source).map(str::to_string)
    else {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Yield source is not configured",
        )
        .into_response();
    };

    match state
        .deposits()
        .run(
            state.store(),
            identity.0.id,
            &group,
            &request.address,
            request.amount,
            &vault_address,
        )
        .await
    {
        Ok(deposit) => {
            state.increment_deposits();
            (StatusCode::CREATED, Json(deposit)).into_response()
        }
        Err(DepositError::Abi(e)) => {
            error(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, e.to_string())
                .into_response()
        }
        Err(DepositError::Store(e)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            e.to_string(),
        )
        .into_response(),
        Err(e) => error(
            StatusCode::BAD_GATEWAY,
            ErrorCode::ChainUnavailable,
            e.to_string(),
        )
        .into_response(),
    }
}

/// List the caller's deposits
/// GET /api/v1/deposits?wage_group_id=...
async fn list_deposits(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<DepositListQuery>,
) -> impl IntoResponse {
    let deposits = state
        .store()
        .list_deposits(identity.0.id, query.wage_group_id)
        .await;
    (StatusCode::OK, Json(deposits))
}

/// Record confidential-leg outcomes on a deposit
/// PATCH /api/v1/deposits/{id}
async fn update_deposit(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<DepositUpdateRequest>,
) -> Response {
    if request.encrypted_erc_tx_hash.is_none() && request.encrypted_erc_status.is_none() {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Nothing to update",
        )
        .into_response();
    }

    if state.store().get_deposit(identity.0.id, id).await.is_none() {
        return error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            "Deposit not found",
        )
        .into_response();
    }

    match state
        .store()
        .update_deposit(
            id,
            None,
            request.encrypted_erc_tx_hash.as_deref(),
            request.encrypted_erc_status.as_deref(),
        )
        .await
    {
        Ok(deposit) => (StatusCode::OK, Json(deposit)).into_response(),
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            e.to_string(),
        )
        .into_response(),
    }
}
