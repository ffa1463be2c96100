//! # Registration Proof Circuit
//!
//! Proves that a user controls the Baby Jubjub private key bound to their
//! wallet address, without revealing the key.
//!
//! ## Statement
//!
//! Public signals (in contract order):
//! - `pk_x`, `pk_y` - the user's Baby Jubjub public key
//! - `address` - the user's wallet address as a field element
//! - `chain_id` - the chain the registration is bound to
//! - `commitment` - `Poseidon(chain_id, secret_key, address)`
//!
//! Private witness:
//! - `secret_key` - scalar derived deterministically from a wallet signature
//!
//! Constraints:
//! - `(pk_x, pk_y) == Base8 * secret_key` (fixed-base scalar multiplication)
//! - `commitment == Poseidon(chain_id, secret_key, address)`
//!
//! ## Artifacts
//!
//! Proving and verifying keys are generated once by the `setup-registration`
//! binary and loaded from an artifacts directory at serve time.

pub mod circuit;
pub mod encoding;
pub mod keys;
pub mod poseidon;
pub mod prover;

/// The circuit field: the BN254 scalar field, which is also the Baby Jubjub
/// base field.
pub type Fr = ark_bn254::Fr;

pub use circuit::{RegistrationCircuit, PUBLIC_INPUT_LEN};
pub use encoding::{ProofWords, SEAL_LEN};
pub use keys::{derive_keypair, registration_message, KeyPair};
pub use poseidon::registration_commitment;
pub use prover::{CircuitError, ProofBundle, RegistrationProver};
