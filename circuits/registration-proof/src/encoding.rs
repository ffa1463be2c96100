//! Contract-word encoding of proofs and public signals.
//!
//! The on-chain verifier takes proofs as `uint256` words: A and C as G1
//! points, B as a G2 point with each Fp2 coefficient pair in high-to-low
//! order (the pairing precompile convention). The same proof is also carried
//! as a fixed 256-byte `A || B || C` seal for storage and transport.

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_groth16::Proof;
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::Fr;

type Bn254Proof = Proof<ark_bn254::Bn254>;

/// Fixed seal length: A (64) + B (128) + C (64).
pub const SEAL_LEN: usize = 256;

/// One 256-bit contract word, big-endian.
pub type Word = [u8; 32];

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("point is not on the curve: {0}")]
    NotOnCurve(&'static str),
    #[error("point is not in the prime-order subgroup: {0}")]
    NotInSubgroup(&'static str),
    #[error("invalid decimal field element: {0}")]
    InvalidSignal(String),
    #[error("invalid seal length: {0}, expected {SEAL_LEN}")]
    InvalidSealLength(usize),
}

/// A Groth16 proof flattened to contract words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofWords {
    pub a: [Word; 2],
    pub b: [[Word; 2]; 2],
    pub c: [Word; 2],
}

/// Encode any prime-field element as a big-endian contract word.
pub fn field_to_word<F: PrimeField>(f: &F) -> Word {
    let bytes = f.into_bigint().to_bytes_be();
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    word
}

/// Decimal string form of a field element, as wallets and circuit tooling
/// exchange signals.
pub fn field_to_decimal<F: PrimeField>(f: &F) -> String {
    f.into_bigint().to_string()
}

pub fn decimal_to_fr(s: &str) -> Result<Fr, EncodingError> {
    Fr::from_str(s).map_err(|_| EncodingError::InvalidSignal(s.to_string()))
}

fn g1_to_words(p: &G1Affine) -> [Word; 2] {
    if p.is_zero() {
        [[0u8; 32]; 2]
    } else {
        [field_to_word(&p.x), field_to_word(&p.y)]
    }
}

fn g1_from_words(words: &[Word; 2], label: &'static str) -> Result<G1Affine, EncodingError> {
    if words[0] == [0u8; 32] && words[1] == [0u8; 32] {
        return Ok(G1Affine::zero());
    }
    let x = Fq::from_be_bytes_mod_order(&words[0]);
    let y = Fq::from_be_bytes_mod_order(&words[1]);
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(EncodingError::NotOnCurve(label));
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EncodingError::NotInSubgroup(label));
    }
    Ok(p)
}

impl ProofWords {
    pub fn from_proof(proof: &Bn254Proof) -> Self {
        // The pairing check reads each Fp2 coefficient pair high-to-low.
        let b = if proof.b.is_zero() {
            [[[0u8; 32]; 2]; 2]
        } else {
            [
                [field_to_word(&proof.b.x.c1), field_to_word(&proof.b.x.c0)],
                [field_to_word(&proof.b.y.c1), field_to_word(&proof.b.y.c0)],
            ]
        };
        Self {
            a: g1_to_words(&proof.a),
            b,
            c: g1_to_words(&proof.c),
        }
    }

    pub fn to_proof(&self) -> Result<Bn254Proof, EncodingError> {
        let a = g1_from_words(&self.a, "A")?;
        let c = g1_from_words(&self.c, "C")?;

        let b_is_zero = self.b.iter().all(|pair| pair.iter().all(|w| w == &[0u8; 32]));
        let b = if b_is_zero {
            G2Affine::zero()
        } else {
            let x = Fq2::new(
                Fq::from_be_bytes_mod_order(&self.b[0][1]),
                Fq::from_be_bytes_mod_order(&self.b[0][0]),
            );
            let y = Fq2::new(
                Fq::from_be_bytes_mod_order(&self.b[1][1]),
                Fq::from_be_bytes_mod_order(&self.b[1][0]),
            );
            let p = G2Affine::new_unchecked(x, y);
            if !p.is_on_curve() {
                return Err(EncodingError::NotOnCurve("B"));
            }
            if !p.is_in_correct_subgroup_assuming_on_curve() {
                return Err(EncodingError::NotInSubgroup("B"));
            }
            p
        };

        Ok(Bn254Proof { a, b, c })
    }

    /// Fixed 256-byte `A || B || C` seal.
    pub fn seal(&self) -> [u8; SEAL_LEN] {
        let mut seal = [0u8; SEAL_LEN];
        let mut offset = 0;
        for word in self
            .a
            .iter()
            .chain(self.b.iter().flatten())
            .chain(self.c.iter())
        {
            seal[offset..offset + 32].copy_from_slice(word);
            offset += 32;
        }
        seal
    }

    pub fn from_seal(seal: &[u8]) -> Result<Self, EncodingError> {
        if seal.len() != SEAL_LEN {
            return Err(EncodingError::InvalidSealLength(seal.len()));
        }
        let word = |i: usize| -> Word {
            let mut w = [0u8; 32];
            w.copy_from_slice(&seal[i * 32..(i + 1) * 32]);
            w
        };
        Ok(Self {
            a: [word(0), word(1)],
            b: [[word(2), word(3)], [word(4), word(5)]],
            c: [word(6), word(7)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_proof() -> Bn254Proof {
        Bn254Proof {
            a: G1Affine::generator(),
            b: G2Affine::generator(),
            c: G1Affine::generator(),
        }
    }

    #[test]
    fn words_roundtrip() {
        let proof = generator_proof();
        let words = ProofWords::from_proof(&proof);
        assert_eq!(words.to_proof().unwrap(), proof);
    }

    #[test]
    fn seal_roundtrip_and_length() {
        let words = ProofWords::from_proof(&generator_proof());
        let seal = words.seal();
        assert_eq!(seal.len(), SEAL_LEN);
        assert_eq!(ProofWords::from_seal(&seal).unwrap(), words);
        assert!(ProofWords::from_seal(&seal[..200]).is_err());
    }

    #[test]
    fn off_curve_point_is_rejected() {
        let mut words = ProofWords::from_proof(&generator_proof());
        words.a[0][31] ^= 1;
        assert!(matches!(
            words.to_proof(),
            Err(EncodingError::NotOnCurve("A"))
        ));
    }

    #[test]
    fn decimal_roundtrip() {
        let x = Fr::from(123456789u64);
        assert_eq!(decimal_to_fr(&field_to_decimal(&x)).unwrap(), x);
        assert!(decimal_to_fr("not-a-number").is_err());
    }

    #[test]
    fn word_padding_is_big_endian() {
        let w = field_to_word(&Fr::from(0x0102u64));
        assert_eq!(w[30], 0x01);
        assert_eq!(w[31], 0x02);
        assert!(w[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn decimal_form_matches_word_bytes() {
        let x = Fr::from(0xdead_beef_u64);
        let from_word = num_bigint::BigUint::from_bytes_be(&field_to_word(&x));
        assert_eq!(from_word.to_str_radix(10), field_to_decimal(&x));
    }
}
