//! End-to-end registration proof round-trip: derive keys from a signature,
//! prove, flatten to contract words, decode, and verify.

use rand::rngs::OsRng;
use registration_proof::{
    derive_keypair, keys::address_to_field, registration_commitment, ProofWords,
    RegistrationProver, PUBLIC_INPUT_LEN,
};

const ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const CHAIN_ID: u64 = 43113;

fn signature() -> Vec<u8> {
    // A fixed 65-byte stand-in for a wallet signature.
    (0u8..65).collect()
}

#[test]
fn full_registration_proof_roundtrip() {
    let prover = RegistrationProver::generate(&mut OsRng).unwrap();

    let pair = derive_keypair(&signature()).unwrap();
    let address = address_to_field(ADDRESS).unwrap();

    let bundle = prover.prove(&pair, address, CHAIN_ID, &mut OsRng).unwrap();
    assert_eq!(bundle.public_inputs.len(), PUBLIC_INPUT_LEN);

    // The commitment signal is the Poseidon registration hash.
    let expected =
        registration_commitment(CHAIN_ID, pair.scalar_in_circuit_field(), address);
    assert_eq!(bundle.public_inputs[4], expected);
    assert_eq!(bundle.public_inputs[0], pair.public_x());
    assert_eq!(bundle.public_inputs[1], pair.public_y());
    assert_eq!(bundle.public_inputs[2], address);

    // Words survive the trip to contract encoding and back.
    let words = ProofWords::from_proof(&bundle.proof);
    let decoded = words.to_proof().unwrap();
    assert!(prover.verify(&decoded, &bundle.public_inputs).unwrap());
}

#[test]
fn proof_is_bound_to_the_address() {
    let prover = RegistrationProver::generate(&mut OsRng).unwrap();

    let pair = derive_keypair(&signature()).unwrap();
    let address = address_to_field(ADDRESS).unwrap();
    let bundle = prover.prove(&pair, address, CHAIN_ID, &mut OsRng).unwrap();

    let other = address_to_field("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc").unwrap();
    let mut tampered = bundle.public_inputs;
    tampered[2] = other;
    assert!(!prover.verify(&bundle.proof, &tampered).unwrap());
}

#[test]
fn proof_from_a_different_wallet_does_not_verify_for_this_key() {
    let prover = RegistrationProver::generate(&mut OsRng).unwrap();

    let address = address_to_field(ADDRESS).unwrap();
    let pair_a = derive_keypair(&signature()).unwrap();
    let pair_b = derive_keypair(&[0xAAu8; 65]).unwrap();

    let bundle_a = prover.prove(&pair_a, address, CHAIN_ID, &mut OsRng).unwrap();

    // Swap in the other wallet's public key: signals no longer match.
    let mut tampered = bundle_a.public_inputs;
    tampered[0] = pair_b.public_x();
    tampered[1] = pair_b.public_y();
    assert!(!prover.verify(&bundle_a.proof, &tampered).unwrap());
}
