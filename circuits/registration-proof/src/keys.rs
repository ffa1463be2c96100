//! Deterministic key derivation
//!
//! Derives a Baby Jubjub keypair from a wallet signature so that the same
//! wallet always produces the same registration keys. The signature is the
//! only entropy source: Keccak-256 digest, Ed25519-style bit clamping,
//! little-endian interpretation, reduction into the prime-subgroup scalar
//! field.

use ark_ec::CurveGroup;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fq, Fr as ScalarField};
use ark_ff::{BigInteger, Field, MontFp, PrimeField, Zero};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Base8: the conventional generator of the Baby Jubjub prime subgroup
/// (cofactor 8 times the curve generator).
const BASE8_X: Fq =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fq =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// A secp256k1 signature is 65 bytes (r, s, v); anything shorter cannot be a
/// wallet signature and is rejected before derivation.
const MIN_SIGNATURE_LEN: usize = 65;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("signature too short: {0} bytes, expected at least {MIN_SIGNATURE_LEN}")]
    SignatureTooShort(usize),
    #[error("invalid signature hex: {0}")]
    InvalidHex(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// The fixed message a wallet signs to derive its registration keys.
pub fn registration_message(address: &str) -> String {
    format!(
        "eERC\nRegistering user with\n Address:{}",
        address.to_lowercase()
    )
}

/// Prime-subgroup generator used for all fixed-base multiplications.
pub fn base8() -> EdwardsAffine {
    EdwardsAffine::new_unchecked(BASE8_X, BASE8_Y)
}

/// A deterministic Baby Jubjub keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Secret scalar in the prime-subgroup scalar field.
    pub scalar: ScalarField,
    /// `Base8 * scalar`.
    pub public: EdwardsAffine,
}

impl KeyPair {
    pub fn public_x(&self) -> Fq {
        self.public.x
    }

    pub fn public_y(&self) -> Fq {
        self.public.y
    }

    /// The secret scalar lifted into the circuit field. The subgroup order is
    /// smaller than the BN254 scalar modulus, so the integer value carries
    /// over without reduction.
    pub fn scalar_in_circuit_field(&self) -> Fq {
        Fq::from_le_bytes_mod_order(&self.scalar.into_bigint().to_bytes_le())
    }
}

/// Derive the secret scalar from a signature.
///
/// Clamping matches the wallet-side derivation: clear the low three bits,
/// clear the top bit, set bit 254, then read the bytes little-endian and
/// reduce modulo the subgroup order. A zero result maps to one so the
/// public key is never the identity.
pub fn derive_scalar(signature: &[u8]) -> Result<ScalarField, KeyError> {
    if signature.len() < MIN_SIGNATURE_LEN {
        return Err(KeyError::SignatureTooShort(signature.len()));
    }

    let mut bytes: [u8; 32] = Keccak256::digest(signature).into();
    bytes[0] &= 0b1111_1000;
    bytes[31] &= 0b0111_1111;
    bytes[31] |= 0b0100_0000;

    let scalar = ScalarField::from_le_bytes_mod_order(&bytes);
    if scalar.is_zero() {
        Ok(ScalarField::ONE)
    } else {
        Ok(scalar)
    }
}

/// Derive the full keypair from a signature.
pub fn derive_keypair(signature: &[u8]) -> Result<KeyPair, KeyError> {
    let scalar = derive_scalar(signature)?;
    let public = (EdwardsProjective::from(base8()) * scalar).into_affine();
    Ok(KeyPair { scalar, public })
}

/// Derive the full keypair from a `0x`-prefixed signature hex string.
pub fn derive_keypair_hex(signature_hex: &str) -> Result<KeyPair, KeyError> {
    let stripped = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let bytes = hex::decode(stripped).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
    derive_keypair(&bytes)
}

/// Parse a `0x`-prefixed 20-byte address into the circuit field.
pub fn address_to_field(address: &str) -> Result<Fq, KeyError> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(stripped).map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
    if bytes.len() != 20 {
        return Err(KeyError::InvalidAddress(format!(
            "expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    // An address is 160 bits, well below the field modulus.
    Ok(Fq::from_be_bytes_mod_order(&bytes))
}
