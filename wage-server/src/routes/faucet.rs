//! Dev-fork faucet endpoints
//!
//! Stablecoin comes out of a configured whale account via impersonation;
//! native coin is set directly with the node's balance override. Neither
//! exists outside a development fork.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::error;
use crate::chain::abi;
use crate::state::AppState;
use crate::types::{ErrorCode, FaucetRequest, FaucetResponse};

const DEFAULT_STABLECOIN_AMOUNT: u64 = 100;
const DEFAULT_NATIVE_AMOUNT: u64 = 10;

/// Wei per native coin unit.
const WEI_PER_NATIVE: u128 = 1_000_000_000_000_000_000;

/// Create faucet routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/faucet", post(stablecoin_faucet))
        .route("/faucet/native", post(native_faucet))
}

/// Send stablecoin from the whale account
/// POST /api/v1/faucet
#[instrument(skip(state, request))]
async fn stablecoin_faucet(
    State(state): State<AppState>,
    Json(request): Json<FaucetRequest>,
) -> Response {
    if !abi::is_address(&request.address) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Address required",
        )
        .into_response();
    }

    let amount = request.amount.unwrap_or(DEFAULT_STABLECOIN_AMOUNT);
    let cap = state.config().faucet_cap;
    if amount > cap {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            format!("Maximum {cap} stablecoin units per request"),
        )
        .into_response();
    }

    let whale = &state.config().faucet_whale;
    if whale.is_empty() {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Faucet is not configured",
        )
        .into_response();
    }

    // Six-decimal stablecoin units.
    let units = amount as u128 * 1_000_000;
    let calldata = match abi::encode_erc20_transfer(&request.address, units) {
        Ok(calldata) => calldata,
        Err(e) => {
            return error(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, e.to_string())
                .into_response()
        }
    };

    match state
        .chain()
        .send_as(whale, &state.config().stablecoin_address, &calldata, Some(90_000))
        .await
    {
        Ok(tx_hash) => {
            info!(%tx_hash, amount, to = %request.address, "faucet transfer sent");
            let response = FaucetResponse {
                success: true,
                message: format!("Sent {amount} stablecoin to {}", request.address),
                tx_hash: Some(tx_hash),
                amount,
                currency: "USDC".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error(
            StatusCode::BAD_GATEWAY,
            ErrorCode::ChainUnavailable,
            e.to_string(),
        )
        .into_response(),
    }
}

/// Top up native coin with the node balance override
/// POST /api/v1/faucet/native
#[instrument(skip(state, request))]
async fn native_faucet(
    State(state): State<AppState>,
    Json(request): Json<FaucetRequest>,
) -> Response {
    if !abi::is_address(&request.address) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Address required",
        )
        .into_response();
    }

    let amount = request.amount.unwrap_or(DEFAULT_NATIVE_AMOUNT);
    let wei = amount as u128 * WEI_PER_NATIVE;

    match state.chain().set_balance(&request.address, wei).await {
        Ok(()) => {
            let response = FaucetResponse {
                success: true,
                message: format!("Funded {} with {amount} native coin", request.address),
                tx_hash: None,
                amount,
                currency: "AVAX".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error(
            StatusCode::BAD_GATEWAY,
            ErrorCode::ChainUnavailable,
            e.to_string(),
        )
        .into_response(),
    }
}
