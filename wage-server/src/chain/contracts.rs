//! Typed wrappers over the contracts the server touches.

use registration_proof::encoding::Word;
use registration_proof::ProofWords;

use super::abi::{self, AbiError};
use super::rpc::{ChainClient, ChainError};

/// The encrypted-ERC registrar.
pub struct Registrar<'a> {
    pub client: &'a ChainClient,
    pub address: &'a str,
}

impl<'a> Registrar<'a> {
    pub fn new(client: &'a ChainClient, address: &'a str) -> Self {
        Self { client, address }
    }

    pub async fn is_user_registered(&self, user: &str) -> Result<bool, RegistrarError> {
        let data = abi::encode_is_user_registered(user)?;
        let result = self.client.eth_call(self.address, &data).await?;
        Ok(abi::decode_bool(&result)?)
    }

    pub async fn get_user_public_key(&self, user: &str) -> Result<[Word; 2], RegistrarError> {
        let data = abi::encode_get_user_public_key(user)?;
        let result = self.client.eth_call(self.address, &data).await?;
        let words = abi::decode_words(&result)?;
        match words.as_slice() {
            [x, y, ..] => Ok([*x, *y]),
            _ => Err(RegistrarError::Abi(AbiError::InvalidQuantity(result))),
        }
    }

    /// View-call the verifier with the standard five signals.
    pub async fn verify_proof(
        &self,
        proof: &ProofWords,
        signals: &[Word; 5],
    ) -> Result<bool, RegistrarError> {
        let data = abi::encode_verify_proof(proof, signals);
        let result = self.client.eth_call(self.address, &data).await?;
        Ok(abi::decode_bool(&result)?)
    }

    pub fn register_calldata(&self, proof: &ProofWords, signals: &[Word]) -> String {
        abi::encode_register(proof, signals)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RegistrarError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Abi(#[from] AbiError),
}

/// Minimal ERC-20 surface.
pub struct Erc20<'a> {
    pub client: &'a ChainClient,
    pub address: &'a str,
}

impl<'a> Erc20<'a> {
    pub fn new(client: &'a ChainClient, address: &'a str) -> Self {
        Self { client, address }
    }

    pub async fn balance_of(&self, owner: &str) -> Result<u128, RegistrarError> {
        let data = abi::encode_erc20_balance_of(owner)?;
        let result = self.client.eth_call(self.address, &data).await?;
        Ok(abi::parse_quantity(&result)?)
    }

    pub fn approve_calldata(&self, spender: &str, amount: u128) -> Result<String, AbiError> {
        abi::encode_erc20_approve(spender, amount)
    }

    pub fn transfer_calldata(&self, to: &str, amount: u128) -> Result<String, AbiError> {
        abi::encode_erc20_transfer(to, amount)
    }
}

/// ERC-4626-style yield vault.
pub struct Vault<'a> {
    pub client: &'a ChainClient,
    pub address: &'a str,
}

impl<'a> Vault<'a> {
    pub fn new(client: &'a ChainClient, address: &'a str) -> Self {
        Self { client, address }
    }

    pub fn deposit_calldata(&self, assets: u128, receiver: &str) -> Result<String, AbiError> {
        abi::encode_vault_deposit(assets, receiver)
    }

    pub fn approve_calldata(&self, spender: &str, amount: u128) -> Result<String, AbiError> {
        abi::encode_erc20_approve(spender, amount)
    }
}

/// The confidential token contract.
pub struct EncryptedErc<'a> {
    pub client: &'a ChainClient,
    pub address: &'a str,
}

impl<'a> EncryptedErc<'a> {
    pub fn new(client: &'a ChainClient, address: &'a str) -> Self {
        Self { client, address }
    }

    pub fn deposit_calldata(&self, amount: u128) -> String {
        abi::encode_eerc_deposit(amount)
    }
}
