//! User profile endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::{error, Identity};
use crate::routes::wage_groups::is_valid_email;
use crate::state::AppState;
use crate::store::StoreError;
use crate::types::{CreateUserRequest, ErrorCode, RegistrationStatusResponse, UpdateNamesRequest};

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/me", patch(update_names))
        .route("/users/registration-status", get(registration_status))
}

/// Create a user profile
/// POST /api/v1/users
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Response {
    if !is_valid_email(&request.email) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Invalid email format",
        )
        .into_response();
    }
    if let Some(wallet) = &request.wallet_address {
        if !crate::chain::abi::is_address(wallet) {
            return error(
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationFailed,
                "Invalid wallet address",
            )
            .into_response();
        }
    }

    match state
        .store()
        .create_user(&request.email, request.wallet_address.as_deref())
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(StoreError::EmailTaken(email)) => error(
            StatusCode::CONFLICT,
            ErrorCode::Conflict,
            format!("Email already in use: {email}"),
        )
        .into_response(),
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            e.to_string(),
        )
        .into_response(),
    }
}

/// Update the caller's display names
/// PATCH /api/v1/users/me
async fn update_names(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<UpdateNamesRequest>,
) -> Response {
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "First and last name are required",
        )
        .into_response();
    }

    match state
        .store()
        .update_user_names(
            identity.0.id,
            request.first_name.trim(),
            request.last_name.trim(),
        )
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(_) => error(StatusCode::NOT_FOUND, ErrorCode::NotFound, "User not found")
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct RegistrationStatusQuery {
    address: Option<String>,
}

/// Registration status by wallet address
/// GET /api/v1/users/registration-status?address=0x...
async fn registration_status(
    State(state): State<AppState>,
    Query(query): Query<RegistrationStatusQuery>,
) -> Response {
    let Some(address) = query.address else {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Address parameter is required",
        )
        .into_response();
    };

    // Unknown wallets are simply unregistered, not an error.
    let response = match state.store().find_user_by_wallet(&address).await {
        Some(user) => RegistrationStatusResponse {
            registered: user.encrypted_erc_registered,
            public_key: user.encrypted_erc_public_key,
            registration_tx_hash: user.encrypted_erc_registration_tx_hash,
        },
        None => RegistrationStatusResponse {
            registered: false,
            public_key: None,
            registration_tx_hash: None,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}
