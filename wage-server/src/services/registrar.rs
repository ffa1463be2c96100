//! Registration submission
//!
//! Deployed registrar/verifier pairs have disagreed on the public-signal
//! shape more than once, so submission walks an ordered strategy table
//! instead of trusting a single encoding: the standard five signals, an
//! empty array, the commitment/address/chain triple, and finally the
//! standard shape with an explicit gas limit. Every attempt is logged and
//! carried in the failure if none lands.

use registration_proof::encoding::Word;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::prover::GeneratedProof;
use crate::chain::contracts::{Registrar, RegistrarError};
use crate::chain::{ChainClient, ChainError};

/// Explicit gas limit for the padded strategy.
const PADDED_GAS: u64 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStrategy {
    /// All five public signals, as the circuit emits them.
    Standard,
    /// No public signals; some verifiers bake them into the proof check.
    EmptySignals,
    /// Only commitment, address, and chain id.
    ExtendedSignals,
    /// Standard signals with an explicit gas limit.
    GasPadded,
}

impl SubmissionStrategy {
    pub const ALL: [SubmissionStrategy; 4] = [
        SubmissionStrategy::Standard,
        SubmissionStrategy::EmptySignals,
        SubmissionStrategy::ExtendedSignals,
        SubmissionStrategy::GasPadded,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SubmissionStrategy::Standard => "standard",
            SubmissionStrategy::EmptySignals => "empty-signals",
            SubmissionStrategy::ExtendedSignals => "extended-signals",
            SubmissionStrategy::GasPadded => "gas-padded",
        }
    }

    /// The public-signal words this strategy submits.
    pub fn signals(&self, proof: &GeneratedProof) -> Vec<Word> {
        let words = proof.signal_words();
        match self {
            SubmissionStrategy::Standard | SubmissionStrategy::GasPadded => words.to_vec(),
            SubmissionStrategy::EmptySignals => Vec::new(),
            // [commitment, address, chain_id]
            SubmissionStrategy::ExtendedSignals => vec![words[4], words[2], words[3]],
        }
    }

    pub fn gas(&self) -> Option<u64> {
        match self {
            SubmissionStrategy::GasPadded => Some(PADDED_GAS),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AttemptFailure {
    pub strategy: &'static str,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub tx_hash: String,
    pub strategy: &'static str,
    /// Failures that preceded the successful attempt.
    pub failed_attempts: Vec<AttemptFailure>,
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("wallet is already registered")]
    AlreadyRegistered,
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Registrar(#[from] RegistrarError),
    #[error("every submission strategy failed")]
    AllStrategiesFailed(Vec<AttemptFailure>),
}

#[derive(Clone)]
pub struct RegistrarService {
    chain: ChainClient,
    address: String,
}

impl RegistrarService {
    pub fn new(chain: ChainClient, address: String) -> Self {
        Self { chain, address }
    }

    pub fn contract_address(&self) -> &str {
        &self.address
    }

    pub async fn is_registered(&self, wallet: &str) -> Result<bool, RegistrationError> {
        let registrar = Registrar::new(&self.chain, &self.address);
        Ok(registrar.is_user_registered(wallet).await?)
    }

    /// Submit a registration proof, walking the strategy table on revert.
    #[instrument(skip(self, proof), fields(wallet = %wallet))]
    pub async fn submit(
        &self,
        wallet: &str,
        proof: &GeneratedProof,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let registrar = Registrar::new(&self.chain, &self.address);

        if registrar.is_user_registered(wallet).await? {
            return Err(RegistrationError::AlreadyRegistered);
        }

        // A failed view check means the proof will revert everywhere; it is
        // still only advisory because not every registrar exposes it.
        match registrar.verify_proof(&proof.proof, &proof.signal_words()).await {
            Ok(true) => info!("verifier view call accepted the proof"),
            Ok(false) => warn!("verifier view call rejected the proof, submitting anyway"),
            Err(e) => info!(error = %e, "verifier view call unavailable"),
        }

        let mut failed_attempts = Vec::new();
        for strategy in SubmissionStrategy::ALL {
            let calldata = registrar.register_calldata(&proof.proof, &strategy.signals(proof));
            info!(strategy = strategy.name(), "submitting registration");

            let attempt = async {
                let tx_hash = self
                    .chain
                    .send_as(wallet, &self.address, &calldata, strategy.gas())
                    .await?;
                self.chain.wait_for_receipt(&tx_hash).await?;
                Ok::<String, ChainError>(tx_hash)
            };

            match attempt.await {
                Ok(tx_hash) => {
                    info!(strategy = strategy.name(), %tx_hash, "registration confirmed");
                    return Ok(RegistrationOutcome {
                        tx_hash,
                        strategy: strategy.name(),
                        failed_attempts,
                    });
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "registration attempt failed");
                    failed_attempts.push(AttemptFailure {
                        strategy: strategy.name(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(RegistrationError::AllStrategiesFailed(failed_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prover::ProverService;
    use std::time::Duration;

    async fn sample_proof() -> GeneratedProof {
        ProverService::mock(1, Duration::from_secs(5))
            .generate(
                "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                &format!("0x{}", hex::encode([9u8; 65])),
                43113,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn strategy_table_order_is_fixed() {
        let names: Vec<_> = SubmissionStrategy::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["standard", "empty-signals", "extended-signals", "gas-padded"]
        );
    }

    #[tokio::test]
    async fn strategies_shape_the_signal_array() {
        let proof = sample_proof().await;
        let words = proof.signal_words();

        assert_eq!(SubmissionStrategy::Standard.signals(&proof).len(), 5);
        assert!(SubmissionStrategy::EmptySignals.signals(&proof).is_empty());

        let extended = SubmissionStrategy::ExtendedSignals.signals(&proof);
        assert_eq!(extended, vec![words[4], words[2], words[3]]);

        assert_eq!(SubmissionStrategy::GasPadded.gas(), Some(500_000));
        assert_eq!(SubmissionStrategy::Standard.gas(), None);
    }
}
