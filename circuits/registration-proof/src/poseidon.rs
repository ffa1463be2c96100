//! Poseidon sponge parameterization
//!
//! One Poseidon configuration is shared by the native commitment and the
//! in-circuit sponge; the prover, the verifier, and the registration hash
//! can never disagree on parameters.

use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::{CryptographicSponge, FieldBasedCryptographicSponge};
use ark_ff::PrimeField;
use std::sync::OnceLock;

use crate::Fr;

/// t = RATE + CAPACITY = 3, the arity the registration hash needs.
const RATE: usize = 2;
const CAPACITY: usize = 1;
const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 57;
/// x^5 S-box, the standard choice for BN254.
const ALPHA: u64 = 5;

static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// The shared Poseidon configuration. Round constants and the MDS matrix are
/// generated with the Grain LFSR procedure, so the table is deterministic
/// across builds.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            RATE,
            FULL_ROUNDS as u64,
            PARTIAL_ROUNDS as u64,
            0,
        );
        PoseidonConfig::new(FULL_ROUNDS, PARTIAL_ROUNDS, ALPHA, mds, ark, RATE, CAPACITY)
    })
}

/// Hash a fixed slice of field elements to one field element.
pub fn poseidon_hash(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&inputs.to_vec());
    sponge.squeeze_native_field_elements(1)[0]
}

/// The registration commitment: `Poseidon(chain_id, secret_key, address)`.
pub fn registration_commitment(chain_id: u64, secret_key: Fr, address: Fr) -> Fr {
    poseidon_hash(&[Fr::from(chain_id), secret_key, address])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_deterministic() {
        let sk = Fr::from(1234u64);
        let addr = Fr::from(0xffffu64);
        assert_eq!(
            registration_commitment(43113, sk, addr),
            registration_commitment(43113, sk, addr)
        );
    }

    #[test]
    fn commitment_is_sensitive_to_every_input() {
        let sk = Fr::from(1234u64);
        let addr = Fr::from(0xffffu64);
        let base = registration_commitment(43113, sk, addr);

        assert_ne!(base, registration_commitment(43114, sk, addr));
        assert_ne!(base, registration_commitment(43113, Fr::from(1235u64), addr));
        assert_ne!(base, registration_commitment(43113, sk, Fr::from(0xfffeu64)));
    }

    #[test]
    fn hash_differs_from_inputs() {
        let inputs = [Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let out = poseidon_hash(&inputs);
        assert!(!inputs.contains(&out));
    }
}
