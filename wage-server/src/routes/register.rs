//! Registration and proof endpoints
//!
//! `POST /register` runs the whole flow: derive keys from the wallet
//! signature, prove, submit with fallback strategies, persist the result.
//! `POST /proofs` stops after proving, for callers that submit themselves.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{error, Identity};
use crate::chain::abi;
use crate::services::{ProverError, RegistrationError};
use crate::state::AppState;
use crate::types::{
    ErrorCode, GenerateProofRequest, GenerateProofResponse, RegisterRequest, RegisterResponse,
    RegistrationStatusResponse, VerifyProofRequest, VerifyProofResponse,
};

/// Create registration routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register).get(registration_state))
        .route("/proofs", post(generate_proof))
        .route("/proofs/verify", post(verify_proof))
}

fn prover_error_response(e: ProverError) -> Response {
    match e {
        ProverError::Key(e) => error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            e.to_string(),
        ),
        ProverError::Encoding(e) => {
            error(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, e)
        }
        ProverError::Timeout(secs) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ProofGenerationFailed,
            format!("Proof generation timed out after {secs} seconds"),
        ),
        ProverError::Generation(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ProofGenerationFailed,
            e,
        ),
        ProverError::ArtifactsUnavailable(e) => {
            error(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, e)
        }
    }
    .into_response()
}

/// Run the full registration flow
/// POST /api/v1/register
#[instrument(skip(state, identity, request), fields(user = %identity.0.id))]
async fn register(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<RegisterRequest>,
) -> Response {
    if !abi::is_address(&request.address) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Invalid wallet address",
        )
        .into_response();
    }

    let chain_id = request.chain_id.unwrap_or(state.config().chain_id);
    let generated = match state
        .prover()
        .generate(&request.address, &request.signature, chain_id)
        .await
    {
        Ok(generated) => generated,
        Err(e) => return prover_error_response(e),
    };
    state.increment_proofs();

    let public_key = generated.public_key_decimal();
    let registration_hash =
        registration_proof::encoding::field_to_decimal(&generated.registration_hash);

    if generated.mock {
        // Dev mode: nothing to submit, but keep the record consistent.
        persist_registration(&state, &identity, &request.address, &public_key, None).await;
        let response = RegisterResponse {
            registered: false,
            public_key,
            registration_hash,
            tx_hash: None,
            strategy: Some("dev-mode".to_string()),
            generation_time_ms: generated.generation_time_ms,
        };
        return (StatusCode::OK, Json(response)).into_response();
    }

    match state.registrar().submit(&request.address, &generated).await {
        Ok(outcome) => {
            persist_registration(
                &state,
                &identity,
                &request.address,
                &public_key,
                Some(&outcome.tx_hash),
            )
            .await;
            state.increment_registrations();
            info!(tx_hash = %outcome.tx_hash, strategy = outcome.strategy, "wallet registered");

            let response = RegisterResponse {
                registered: true,
                public_key,
                registration_hash,
                tx_hash: Some(outcome.tx_hash),
                strategy: Some(outcome.strategy.to_string()),
                generation_time_ms: generated.generation_time_ms,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(RegistrationError::AlreadyRegistered) => error(
            StatusCode::CONFLICT,
            ErrorCode::AlreadyRegistered,
            "Wallet is already registered",
        )
        .into_response(),
        Err(RegistrationError::AllStrategiesFailed(attempts)) => {
            let body = crate::types::ErrorResponse {
                code: ErrorCode::SubmissionFailed,
                message: "Every submission strategy reverted; the circuit and the deployed verifier likely disagree"
                    .to_string(),
                details: serde_json::to_value(&attempts).ok(),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
        Err(e) => error(
            StatusCode::BAD_GATEWAY,
            ErrorCode::ChainUnavailable,
            e.to_string(),
        )
        .into_response(),
    }
}

/// The chain is the source of truth; a store failure here must not undo a
/// confirmed registration.
async fn persist_registration(
    state: &AppState,
    identity: &Identity,
    address: &str,
    public_key: &[String; 2],
    tx_hash: Option<&str>,
) {
    if let Err(e) = state
        .store()
        .record_registration(identity.0.id, address, public_key.clone(), tx_hash)
        .await
    {
        warn!(error = %e, "failed to persist registration record");
    }
}

/// Registration state of the calling user
/// GET /api/v1/register
async fn registration_state(identity: Identity) -> impl IntoResponse {
    let user = identity.0;
    let response = RegistrationStatusResponse {
        registered: user.encrypted_erc_registered,
        public_key: user.encrypted_erc_public_key,
        registration_tx_hash: user.encrypted_erc_registration_tx_hash,
    };
    (StatusCode::OK, Json(response))
}

/// Generate a registration proof without submitting it
/// POST /api/v1/proofs
#[instrument(skip(state, request))]
async fn generate_proof(
    State(state): State<AppState>,
    Json(request): Json<GenerateProofRequest>,
) -> Response {
    if !abi::is_address(&request.address) {
        return error(
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            "Invalid wallet address",
        )
        .into_response();
    }

    let chain_id = request.chain_id.unwrap_or(state.config().chain_id);
    match state
        .prover()
        .generate(&request.address, &request.signature, chain_id)
        .await
    {
        Ok(generated) => {
            state.increment_proofs();
            let response = GenerateProofResponse {
                registration_hash: registration_proof::encoding::field_to_decimal(
                    &generated.registration_hash,
                ),
                public_signals: generated.public_signals_decimal(),
                proof: generated.proof,
                generation_time_ms: generated.generation_time_ms,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => prover_error_response(e),
    }
}

/// Verify a proof against the verifying key
/// POST /api/v1/proofs/verify
async fn verify_proof(
    State(state): State<AppState>,
    Json(request): Json<VerifyProofRequest>,
) -> Response {
    match state
        .prover()
        .verify(&request.proof, &request.public_signals)
    {
        Ok(valid) => (
            StatusCode::OK,
            Json(VerifyProofResponse { valid, error: None }),
        )
            .into_response(),
        Err(ProverError::Encoding(e)) => (
            StatusCode::BAD_REQUEST,
            Json(VerifyProofResponse {
                valid: false,
                error: Some(e),
            }),
        )
            .into_response(),
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ProofVerificationFailed,
            e.to_string(),
        )
        .into_response(),
    }
}
