//! Health and status endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::services::registrar::SubmissionStrategy;
use crate::state::AppState;
use crate::types::{HealthResponse, StatusResponse};

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
}

/// Health check endpoint
/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dev_mode: state.prover().dev_mode(),
        chain_id: state.config().chain_id,
    };
    (StatusCode::OK, Json(response))
}

/// Detailed status endpoint
/// GET /status
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let response = StatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.config().chain_id,
        registrar_address: state.config().registrar_address.clone(),
        submission_strategies: SubmissionStrategy::ALL
            .iter()
            .map(|s| s.name().to_string())
            .collect(),
        total_proofs: state.total_proofs(),
        total_registrations: state.total_registrations(),
        total_deposits: state.total_deposits(),
        uptime_secs: state.uptime_secs(),
    };
    (StatusCode::OK, Json(response))
}
