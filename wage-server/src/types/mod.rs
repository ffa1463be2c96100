//! Type definitions for the WageRail API
//!
//! Request/response bodies, error codes, and the wire form of proofs.

use chrono::NaiveDate;
use registration_proof::ProofWords;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error codes returned by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request failed field validation
    ValidationFailed,
    /// Caller identity missing or unknown
    Unauthorized,
    /// Resource missing or not owned by the caller
    NotFound,
    /// The wallet is already registered on-chain
    AlreadyRegistered,
    /// The resource already exists
    Conflict,
    /// Proof generation failed or timed out
    ProofGenerationFailed,
    /// Proof verification failed
    ProofVerificationFailed,
    /// Every submission strategy reverted
    SubmissionFailed,
    /// Chain RPC unreachable or returned an error
    ChainUnavailable,
    /// Internal server error
    InternalError,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }
}

// ==================== Health ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dev_mode: bool,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub chain_id: u64,
    pub registrar_address: String,
    /// Submission strategies, in the order they are tried
    pub submission_strategies: Vec<String>,
    pub total_proofs: u64,
    pub total_registrations: u64,
    pub total_deposits: u64,
    pub uptime_secs: u64,
}

// ==================== Registration ====================

/// Request to run the full registration flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The wallet address being registered
    pub address: String,
    /// Hex signature over the registration message
    pub signature: String,
    /// Defaults to the configured chain
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registered: bool,
    /// Baby Jubjub public key as decimal strings
    pub public_key: [String; 2],
    pub registration_hash: String,
    /// Transaction hash of the successful submission, absent in dev mode
    pub tx_hash: Option<String>,
    /// Which submission strategy succeeded
    pub strategy: Option<String>,
    pub generation_time_ms: u64,
}

/// Request to only generate a registration proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProofRequest {
    pub address: String,
    pub signature: String,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateProofResponse {
    pub proof: ProofWords,
    /// Decimal public signals in verifier order
    pub public_signals: Vec<String>,
    pub registration_hash: String,
    pub generation_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyProofRequest {
    pub proof: ProofWords,
    pub public_signals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyProofResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationStatusResponse {
    pub registered: bool,
    pub public_key: Option<[String; 2]>,
    pub registration_tx_hash: Option<String>,
}

// ==================== Users ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNamesRequest {
    pub first_name: String,
    pub last_name: String,
}

// ==================== Wage groups ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayeeInput {
    pub email: String,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WageGroupRequest {
    pub name: String,
    pub start_date: NaiveDate,
    /// Day of month in [1, 31]
    pub payment_day: u8,
    pub yield_source: Option<String>,
    pub payees: Vec<PayeeInput>,
}

// ==================== Deposits ====================

/// Request to run the funding pipeline for a wage group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    pub wage_group_id: Uuid,
    /// Wallet funding the deposit
    pub address: String,
    /// Stablecoin amount in whole units
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositUpdateRequest {
    pub encrypted_erc_tx_hash: Option<String>,
    pub encrypted_erc_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositListQuery {
    pub wage_group_id: Option<Uuid>,
}

// ==================== Faucet ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetRequest {
    pub address: String,
    /// Whole stablecoin units, defaults to 100
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetResponse {
    pub success: bool,
    pub message: String,
    pub tx_hash: Option<String>,
    pub amount: u64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::ProofGenerationFailed).unwrap();
        assert_eq!(json, "\"PROOF_GENERATION_FAILED\"");
    }

    #[test]
    fn register_request_roundtrip() {
        let json = r#"{"address":"0xabc","signature":"0x1234"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.address, "0xabc");
        assert!(req.chain_id.is_none());
    }

    #[test]
    fn error_response_omits_empty_details() {
        let err = ErrorResponse::new(ErrorCode::NotFound, "missing");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("details"));
    }
}
