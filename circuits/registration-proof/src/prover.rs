//! Groth16 setup, proving, and verification for the registration circuit.
//!
//! Keys are generated once by the `setup-registration` binary and written to
//! an artifacts directory; the server loads them at startup the same way the
//! proving artifacts of any other circuit would be.

use ark_bn254::Bn254;
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use rand::{CryptoRng, RngCore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::circuit::{RegistrationCircuit, PUBLIC_INPUT_LEN};
use crate::keys::KeyPair;
use crate::Fr;

/// File names inside the artifacts directory.
pub const PROVING_KEY_FILE: &str = "registration.pk";
pub const VERIFYING_KEY_FILE: &str = "registration.vk";

#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("circuit synthesis failed: {0}")]
    Synthesis(String),
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
    #[error("artifact serialization failed: {0}")]
    Serialization(String),
}

impl From<ark_relations::r1cs::SynthesisError> for CircuitError {
    fn from(e: ark_relations::r1cs::SynthesisError) -> Self {
        CircuitError::Synthesis(e.to_string())
    }
}

/// A proof together with its public signals, in verifier order.
#[derive(Debug, Clone)]
pub struct ProofBundle {
    pub proof: Proof<Bn254>,
    pub public_inputs: [Fr; PUBLIC_INPUT_LEN],
}

/// Holds the circuit keys and drives proving/verification.
pub struct RegistrationProver {
    proving_key: ProvingKey<Bn254>,
    verifying_key: VerifyingKey<Bn254>,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl RegistrationProver {
    pub fn new(proving_key: ProvingKey<Bn254>) -> Self {
        let verifying_key = proving_key.vk.clone();
        let prepared_vk = prepare_verifying_key(&verifying_key);
        Self {
            proving_key,
            verifying_key,
            prepared_vk,
        }
    }

    /// Run the circuit-specific setup. Only used by the setup binary and
    /// tests; production keys come from the artifacts directory.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, CircuitError> {
        let (pk, _vk) =
            Groth16::<Bn254>::circuit_specific_setup(RegistrationCircuit::blank(), rng)
                .map_err(|e| CircuitError::Synthesis(e.to_string()))?;
        Ok(Self::new(pk))
    }

    /// Load keys from `<dir>/registration.pk`.
    pub fn from_artifacts(dir: &Path) -> Result<Self, CircuitError> {
        let pk_path = dir.join(PROVING_KEY_FILE);
        let file = File::open(&pk_path)
            .map_err(|e| CircuitError::ArtifactNotFound(format!("{}: {e}", pk_path.display())))?;
        let pk = ProvingKey::<Bn254>::deserialize_compressed(BufReader::new(file))
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        info!(path = %pk_path.display(), "Loaded registration proving key");
        Ok(Self::new(pk))
    }

    /// Write both keys into `dir`.
    pub fn write_artifacts(&self, dir: &Path) -> Result<(), CircuitError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;

        let mut pk_file = File::create(dir.join(PROVING_KEY_FILE))
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        self.proving_key
            .serialize_compressed(&mut pk_file)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;

        let mut vk_file = File::create(dir.join(VERIFYING_KEY_FILE))
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;
        self.verifying_key
            .serialize_compressed(&mut vk_file)
            .map_err(|e| CircuitError::Serialization(e.to_string()))?;

        Ok(())
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.verifying_key
    }

    /// Prove the registration statement for a derived keypair.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        pair: &KeyPair,
        address: Fr,
        chain_id: u64,
        rng: &mut R,
    ) -> Result<ProofBundle, CircuitError> {
        let (circuit, public_inputs) = RegistrationCircuit::assigned(pair, address, chain_id);
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, rng)
            .map_err(|e| CircuitError::Synthesis(e.to_string()))?;
        Ok(ProofBundle {
            proof,
            public_inputs,
        })
    }

    /// Verify a proof against public signals in verifier order.
    pub fn verify(&self, proof: &Proof<Bn254>, public_inputs: &[Fr]) -> Result<bool, CircuitError> {
        Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, public_inputs, proof)
            .map_err(|e| CircuitError::Synthesis(e.to_string()))
    }
}
