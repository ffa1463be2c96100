//! Manual ABI encoding
//!
//! The server makes a handful of fixed contract calls; encoding them by hand
//! keeps the chain surface to selectors plus 32-byte words. Dynamic arrays
//! follow the standard head/tail layout (offset word in the head, length
//! followed by elements in the tail).

use registration_proof::encoding::Word;
use registration_proof::ProofWords;
use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbiError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid hex quantity: {0}")]
    InvalidQuantity(String),
    #[error("quantity does not fit in 128 bits: {0}")]
    Overflow(String),
}

/// First four bytes of the Keccak-256 of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn word_from_u128(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn word_from_address(address: &str) -> Result<Word, AbiError> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let bytes =
        hex::decode(stripped).map_err(|_| AbiError::InvalidAddress(address.to_string()))?;
    if bytes.len() != 20 {
        return Err(AbiError::InvalidAddress(address.to_string()));
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// `0x`-prefixed address sanity check.
pub fn is_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .map_or(false, |rest| rest.len() == 40 && rest.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Builds `0x<selector><words...>` calldata.
pub struct CallBuilder {
    data: Vec<u8>,
}

impl CallBuilder {
    pub fn new(signature: &str) -> Self {
        Self {
            data: selector(signature).to_vec(),
        }
    }

    pub fn word(mut self, word: Word) -> Self {
        self.data.extend_from_slice(&word);
        self
    }

    pub fn words(mut self, words: &[Word]) -> Self {
        for word in words {
            self.data.extend_from_slice(word);
        }
        self
    }

    pub fn build(self) -> String {
        format!("0x{}", hex::encode(self.data))
    }
}

/// Flatten a proof into its eight head words: A, B, C.
fn proof_words(proof: &ProofWords) -> Vec<Word> {
    let mut words = Vec::with_capacity(8);
    words.extend_from_slice(&proof.a);
    words.extend_from_slice(&proof.b[0]);
    words.extend_from_slice(&proof.b[1]);
    words.extend_from_slice(&proof.c);
    words
}

/// `register(uint256[2],uint256[2][2],uint256[2],uint256[])`
///
/// The signal array is dynamic: its head slot carries the tail offset
/// (9 static words = 0x120), the tail carries length then elements.
pub fn encode_register(proof: &ProofWords, signals: &[Word]) -> String {
    let mut builder = CallBuilder::new("register(uint256[2],uint256[2][2],uint256[2],uint256[])")
        .words(&proof_words(proof))
        .word(word_from_u128(9 * 32))
        .word(word_from_u128(signals.len() as u128));
    for signal in signals {
        builder = builder.word(*signal);
    }
    builder.build()
}

/// `verifyProof(uint256[2],uint256[2][2],uint256[2],uint256[5])` - fully
/// static, thirteen words.
pub fn encode_verify_proof(proof: &ProofWords, signals: &[Word; 5]) -> String {
    CallBuilder::new("verifyProof(uint256[2],uint256[2][2],uint256[2],uint256[5])")
        .words(&proof_words(proof))
        .words(signals)
        .build()
}

pub fn encode_is_user_registered(user: &str) -> Result<String, AbiError> {
    Ok(CallBuilder::new("isUserRegistered(address)")
        .word(word_from_address(user)?)
        .build())
}

pub fn encode_get_user_public_key(user: &str) -> Result<String, AbiError> {
    Ok(CallBuilder::new("getUserPublicKey(address)")
        .word(word_from_address(user)?)
        .build())
}

pub fn encode_erc20_approve(spender: &str, amount: u128) -> Result<String, AbiError> {
    Ok(CallBuilder::new("approve(address,uint256)")
        .word(word_from_address(spender)?)
        .word(word_from_u128(amount))
        .build())
}

pub fn encode_erc20_transfer(to: &str, amount: u128) -> Result<String, AbiError> {
    Ok(CallBuilder::new("transfer(address,uint256)")
        .word(word_from_address(to)?)
        .word(word_from_u128(amount))
        .build())
}

pub fn encode_erc20_balance_of(owner: &str) -> Result<String, AbiError> {
    Ok(CallBuilder::new("balanceOf(address)")
        .word(word_from_address(owner)?)
        .build())
}

/// ERC-4626 `deposit(uint256 assets, address receiver)`
pub fn encode_vault_deposit(assets: u128, receiver: &str) -> Result<String, AbiError> {
    Ok(CallBuilder::new("deposit(uint256,address)")
        .word(word_from_u128(assets))
        .word(word_from_address(receiver)?)
        .build())
}

/// Encrypted ERC `deposit(uint256 amount)`
pub fn encode_eerc_deposit(amount: u128) -> String {
    CallBuilder::new("deposit(uint256)")
        .word(word_from_u128(amount))
        .build()
}

/// Decode a single bool return word.
pub fn decode_bool(result: &str) -> Result<bool, AbiError> {
    let value = parse_quantity(result)?;
    Ok(value != 0)
}

/// Parse a hex quantity (`0x` prefixed, any width up to 128 bits).
pub fn parse_quantity(raw: &str) -> Result<u128, AbiError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    if stripped.is_empty() || !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AbiError::InvalidQuantity(raw.to_string()));
    }
    let trimmed = stripped.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    if trimmed.len() > 32 {
        return Err(AbiError::Overflow(raw.to_string()));
    }
    u128::from_str_radix(trimmed, 16).map_err(|_| AbiError::InvalidQuantity(raw.to_string()))
}

/// Split an `eth_call` return into 32-byte words.
pub fn decode_words(result: &str) -> Result<Vec<Word>, AbiError> {
    let stripped = result.strip_prefix("0x").unwrap_or(result);
    let bytes =
        hex::decode(stripped).map_err(|_| AbiError::InvalidQuantity(result.to_string()))?;
    if bytes.len() % 32 != 0 {
        return Err(AbiError::InvalidQuantity(result.to_string()));
    }
    Ok(bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn sample_proof() -> ProofWords {
        // The layout tests only care about word positions, not curve math.
        let w = |n: u128| word_from_u128(n);
        ProofWords {
            a: [w(1), w(2)],
            b: [[w(3), w(4)], [w(5), w(6)]],
            c: [w(7), w(8)],
        }
    }

    #[test]
    fn known_erc20_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("approve(address,uint256)")), "095ea7b3");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        // ERC-4626 deposit
        assert_eq!(hex::encode(selector("deposit(uint256,address)")), "6e553f65");
    }

    #[test]
    fn register_calldata_layout() {
        let proof = sample_proof();
        let signals = vec![word_from_u128(7), word_from_u128(8)];
        let calldata = encode_register(&proof, &signals);
        let bytes = hex::decode(&calldata[2..]).unwrap();

        // selector + 8 proof words + offset + length + 2 elements
        assert_eq!(bytes.len(), 4 + 32 * (8 + 1 + 1 + 2));
        // offset word points right past the static head
        assert_eq!(&bytes[4 + 8 * 32..4 + 9 * 32], &word_from_u128(288));
        // length word
        assert_eq!(&bytes[4 + 9 * 32..4 + 10 * 32], &word_from_u128(2));
    }

    #[test]
    fn empty_signal_array_still_has_length_word() {
        let calldata = encode_register(&sample_proof(), &[]);
        let bytes = hex::decode(&calldata[2..]).unwrap();
        assert_eq!(bytes.len(), 4 + 32 * 10);
        assert_eq!(&bytes[4 + 9 * 32..], &word_from_u128(0));
    }

    #[test]
    fn verify_proof_calldata_is_static() {
        let signals = [word_from_u128(1); 5];
        let calldata = encode_verify_proof(&sample_proof(), &signals);
        let bytes = hex::decode(&calldata[2..]).unwrap();
        assert_eq!(bytes.len(), 4 + 32 * 13);
    }

    #[test]
    fn address_word_is_right_aligned() {
        let word = word_from_address(ADDR).unwrap();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(hex::encode(&word[12..]), ADDR[2..]);
        assert!(word_from_address("0x1234").is_err());
    }

    #[test]
    fn address_validation() {
        assert!(is_address(ADDR));
        assert!(!is_address("70997970c51812dc3a010c7d01b50e0d17dc79c8"));
        assert!(!is_address("0x123"));
        assert!(!is_address("0xzz97970c51812dc3a010c7d01b50e0d17dc79c8"));
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x00000f").unwrap(), 15);
        assert_eq!(
            parse_quantity(&format!("0x{:064x}", 12345u64)).unwrap(),
            12345
        );
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity(&format!("0x{}", "f".repeat(40))).is_err());
    }

    #[test]
    fn bool_decoding() {
        assert!(decode_bool(&format!("0x{:064x}", 1u8)).unwrap());
        assert!(!decode_bool(&format!("0x{:064x}", 0u8)).unwrap());
    }
}
