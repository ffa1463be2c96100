//! The registration constraint system.

use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_ed_on_bn254::constraints::EdwardsVar;
use ark_ed_on_bn254::EdwardsProjective;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::ns;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::keys::{base8, KeyPair};
use crate::poseidon::{poseidon_config, registration_commitment};
use crate::Fr;

/// `[pk_x, pk_y, address, chain_id, commitment]` - the order the deployed
/// verifier expects, and therefore the order inputs are allocated in.
pub const PUBLIC_INPUT_LEN: usize = 5;

/// Proves knowledge of the secret key behind a registered public key, bound
/// to an address and chain through the Poseidon commitment.
#[derive(Clone, Default)]
pub struct RegistrationCircuit {
    /// Private witness: the Baby Jubjub secret scalar, as a circuit-field
    /// element.
    pub secret_key: Option<Fr>,
    pub public_key_x: Option<Fr>,
    pub public_key_y: Option<Fr>,
    pub address: Option<Fr>,
    pub chain_id: Option<Fr>,
    pub commitment: Option<Fr>,
}

impl RegistrationCircuit {
    /// A circuit with no assignments, for key generation.
    pub fn blank() -> Self {
        Self::default()
    }

    /// A fully assigned circuit plus its public inputs in verifier order.
    pub fn assigned(pair: &KeyPair, address: Fr, chain_id: u64) -> (Self, [Fr; PUBLIC_INPUT_LEN]) {
        let secret = pair.scalar_in_circuit_field();
        let commitment = registration_commitment(chain_id, secret, address);
        let inputs = [
            pair.public_x(),
            pair.public_y(),
            address,
            Fr::from(chain_id),
            commitment,
        ];
        let circuit = Self {
            secret_key: Some(secret),
            public_key_x: Some(inputs[0]),
            public_key_y: Some(inputs[1]),
            address: Some(address),
            chain_id: Some(Fr::from(chain_id)),
            commitment: Some(commitment),
        };
        (circuit, inputs)
    }
}

impl ConstraintSynthesizer<Fr> for RegistrationCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let secret_key = FpVar::new_witness(ns!(cs, "secret_key"), || {
            self.secret_key.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // Instance allocation order fixes the public-signal layout.
        let public_key_x = FpVar::new_input(ns!(cs, "public_key_x"), || {
            self.public_key_x.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let public_key_y = FpVar::new_input(ns!(cs, "public_key_y"), || {
            self.public_key_y.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let address = FpVar::new_input(ns!(cs, "address"), || {
            self.address.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let chain_id = FpVar::new_input(ns!(cs, "chain_id"), || {
            self.chain_id.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let commitment = FpVar::new_input(ns!(cs, "commitment"), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // (pk_x, pk_y) == Base8 * secret_key
        let base = EdwardsVar::new_constant(ns!(cs, "base8"), EdwardsProjective::from(base8()))?;
        let scalar_bits = secret_key.to_bits_le()?;
        let derived = base.scalar_mul_le(scalar_bits.iter())?;
        derived.x.enforce_equal(&public_key_x)?;
        derived.y.enforce_equal(&public_key_y)?;

        // commitment == Poseidon(chain_id, secret_key, address)
        let mut sponge = PoseidonSpongeVar::new(cs, poseidon_config());
        sponge.absorb(&vec![chain_id, secret_key, address])?;
        let squeezed = sponge.squeeze_field_elements(1)?;
        squeezed[0].enforce_equal(&commitment)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_keypair;
    use ark_relations::r1cs::ConstraintSystem;

    fn assigned_circuit() -> (RegistrationCircuit, [Fr; PUBLIC_INPUT_LEN]) {
        let pair = derive_keypair(&[5u8; 65]).unwrap();
        RegistrationCircuit::assigned(&pair, Fr::from(0xabcdefu64), 43113)
    }

    #[test]
    fn satisfied_with_correct_witness() {
        let (circuit, _) = assigned_circuit();
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_instance_variables(), PUBLIC_INPUT_LEN + 1);
    }

    #[test]
    fn unsatisfied_with_wrong_public_key() {
        let (mut circuit, _) = assigned_circuit();
        circuit.public_key_x = circuit.public_key_x.map(|x| x + Fr::from(1u64));
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn unsatisfied_with_wrong_commitment() {
        let (mut circuit, _) = assigned_circuit();
        circuit.commitment = circuit.commitment.map(|c| c + Fr::from(1u64));
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn unsatisfied_with_foreign_chain() {
        let pair = derive_keypair(&[5u8; 65]).unwrap();
        let (circuit, _) = RegistrationCircuit::assigned(&pair, Fr::from(0xabcdefu64), 43113);
        let mut moved = circuit;
        moved.chain_id = Some(Fr::from(1u64));
        let cs = ConstraintSystem::<Fr>::new_ref();
        moved.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
