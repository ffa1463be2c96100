//! Proof generation service
//!
//! Wraps the registration prover with the serving concerns: artifact
//! loading, a concurrency limit, a per-proof timeout, and a dev mode that
//! mocks the proof while still computing the real public signals.

use registration_proof::encoding::{decimal_to_fr, field_to_decimal, field_to_word, Word};
use registration_proof::keys::{address_to_field, derive_keypair_hex, KeyError, KeyPair};
use registration_proof::{
    registration_commitment, CircuitError, ProofWords, RegistrationCircuit, RegistrationProver,
    PUBLIC_INPUT_LEN,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::config::Config;

type Fr = registration_proof::Fr;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("proving artifacts unavailable: {0}")]
    ArtifactsUnavailable(String),
    #[error("proof generation timed out after {0} seconds")]
    Timeout(u64),
    #[error("proof generation failed: {0}")]
    Generation(String),
    #[error("invalid proof encoding: {0}")]
    Encoding(String),
}

/// A generated registration proof plus everything derived on the way.
#[derive(Debug, Clone)]
pub struct GeneratedProof {
    pub pair: KeyPair,
    pub proof: ProofWords,
    /// `[pk_x, pk_y, address, chain_id, commitment]`
    pub public_inputs: [Fr; PUBLIC_INPUT_LEN],
    pub registration_hash: Fr,
    pub generation_time_ms: u64,
    /// True when produced by dev mode instead of the real prover.
    pub mock: bool,
}

impl GeneratedProof {
    pub fn public_signals_decimal(&self) -> Vec<String> {
        self.public_inputs.iter().map(field_to_decimal).collect()
    }

    pub fn signal_words(&self) -> [Word; PUBLIC_INPUT_LEN] {
        let mut words = [[0u8; 32]; PUBLIC_INPUT_LEN];
        for (word, input) in words.iter_mut().zip(self.public_inputs.iter()) {
            *word = field_to_word(input);
        }
        words
    }

    pub fn public_key_decimal(&self) -> [String; 2] {
        [
            field_to_decimal(&self.pair.public_x()),
            field_to_decimal(&self.pair.public_y()),
        ]
    }
}

#[derive(Clone)]
pub struct ProverService {
    inner: Arc<ProverInner>,
}

struct ProverInner {
    prover: Option<RegistrationProver>,
    semaphore: Semaphore,
    timeout: Duration,
    dev_mode: bool,
}

impl ProverService {
    /// Load artifacts from the configured directory. Missing artifacts are
    /// fatal outside dev mode.
    pub fn new(config: &Config) -> Result<Self, ProverError> {
        let prover = match RegistrationProver::from_artifacts(&config.artifacts_dir) {
            Ok(prover) => Some(prover),
            Err(CircuitError::ArtifactNotFound(path)) if config.dev_mode => {
                warn!(%path, "proving artifacts missing, dev mode will mock proofs");
                None
            }
            Err(e) => return Err(ProverError::ArtifactsUnavailable(e.to_string())),
        };

        Ok(Self {
            inner: Arc::new(ProverInner {
                prover,
                semaphore: Semaphore::new(config.max_concurrent_proofs),
                timeout: Duration::from_secs(config.proof_timeout_secs),
                dev_mode: config.dev_mode,
            }),
        })
    }

    /// Build a service around an already constructed prover (tests).
    pub fn with_prover(prover: RegistrationProver, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(ProverInner {
                prover: Some(prover),
                semaphore: Semaphore::new(max_concurrent),
                timeout,
                dev_mode: false,
            }),
        }
    }

    /// A proverless dev-mode service (tests, mock deployments).
    pub fn mock(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(ProverInner {
                prover: None,
                semaphore: Semaphore::new(max_concurrent),
                timeout,
                dev_mode: true,
            }),
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.inner.dev_mode
    }

    /// Derive keys from the signature and prove the registration statement.
    #[instrument(skip(self, signature_hex))]
    pub async fn generate(
        &self,
        address: &str,
        signature_hex: &str,
        chain_id: u64,
    ) -> Result<GeneratedProof, ProverError> {
        let start = Instant::now();
        let pair = derive_keypair_hex(signature_hex)?;
        let address_field = address_to_field(address)?;
        let secret = pair.scalar_in_circuit_field();
        let registration_hash = registration_commitment(chain_id, secret, address_field);

        let _permit = self
            .inner
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProverError::Generation(e.to_string()))?;

        let (proof, public_inputs, mock) = match &self.inner.prover {
            Some(_) => {
                let inner = Arc::clone(&self.inner);
                let worker_pair = pair.clone();
                let task = tokio::task::spawn_blocking(move || {
                    let prover = inner
                        .prover
                        .as_ref()
                        .expect("prover checked above");
                    prover.prove(
                        &worker_pair,
                        address_field,
                        chain_id,
                        &mut rand::rngs::OsRng,
                    )
                });

                let bundle = tokio::time::timeout(self.inner.timeout, task)
                    .await
                    .map_err(|_| ProverError::Timeout(self.inner.timeout.as_secs()))?
                    .map_err(|e| ProverError::Generation(e.to_string()))?
                    .map_err(|e| ProverError::Generation(e.to_string()))?;

                (
                    ProofWords::from_proof(&bundle.proof),
                    bundle.public_inputs,
                    false,
                )
            }
            None if self.inner.dev_mode => {
                // The signals are computed for real; only the proof itself
                // is a placeholder.
                let (_, public_inputs) =
                    RegistrationCircuit::assigned(&pair, address_field, chain_id);
                let proof = ProofWords {
                    a: [[0u8; 32]; 2],
                    b: [[[0u8; 32]; 2]; 2],
                    c: [[0u8; 32]; 2],
                };
                (proof, public_inputs, true)
            }
            None => {
                return Err(ProverError::ArtifactsUnavailable(
                    "no proving key loaded".to_string(),
                ))
            }
        };

        let generation_time_ms = start.elapsed().as_millis() as u64;
        info!(
            generation_time_ms,
            mock, "Registration proof generated"
        );

        Ok(GeneratedProof {
            pair,
            proof,
            public_inputs,
            registration_hash,
            generation_time_ms,
            mock,
        })
    }

    /// Verify decimal signals plus contract words against the verifying key.
    pub fn verify(&self, proof: &ProofWords, signals: &[String]) -> Result<bool, ProverError> {
        let prover = self.inner.prover.as_ref().ok_or_else(|| {
            ProverError::ArtifactsUnavailable("no verifying key loaded".to_string())
        })?;

        let decoded = proof
            .to_proof()
            .map_err(|e| ProverError::Encoding(e.to_string()))?;
        let inputs = signals
            .iter()
            .map(|s| decimal_to_fr(s).map_err(|e| ProverError::Encoding(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        prover
            .verify(&decoded, &inputs)
            .map_err(|e| ProverError::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registration_proof::keys::registration_message;

    fn signature_hex() -> String {
        format!("0x{}", hex::encode([7u8; 65]))
    }

    const ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[tokio::test]
    async fn dev_mode_mocks_proof_with_real_signals() {
        let service = ProverService::mock(2, Duration::from_secs(5));
        let generated = service
            .generate(ADDRESS, &signature_hex(), 43113)
            .await
            .unwrap();

        assert!(generated.mock);
        assert_eq!(generated.public_inputs[4], generated.registration_hash);
        assert_eq!(generated.public_signals_decimal().len(), PUBLIC_INPUT_LEN);
        // The placeholder proof is all zeros.
        assert_eq!(generated.proof.a, [[0u8; 32]; 2]);
    }

    #[tokio::test]
    async fn real_prover_roundtrip() {
        let prover = RegistrationProver::generate(&mut rand::rngs::OsRng).unwrap();
        let service = ProverService::with_prover(prover, 1, Duration::from_secs(120));

        let generated = service
            .generate(ADDRESS, &signature_hex(), 43113)
            .await
            .unwrap();
        assert!(!generated.mock);

        let valid = service
            .verify(&generated.proof, &generated.public_signals_decimal())
            .unwrap();
        assert!(valid);
    }

    #[tokio::test]
    async fn invalid_signature_hex_is_rejected() {
        let service = ProverService::mock(1, Duration::from_secs(5));
        let err = service
            .generate(ADDRESS, "0xnothex", 43113)
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::Key(_)));
    }

    #[test]
    fn message_binds_the_address() {
        let msg = registration_message(ADDRESS);
        assert!(msg.contains(ADDRESS));
    }
}
