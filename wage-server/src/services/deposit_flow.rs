//! The funding pipeline
//!
//! approve stablecoin -> vault deposit -> read shares from the Transfer log
//! -> record the deposit -> approve shares -> encrypted deposit -> finalize.
//!
//! Chain writes are sequential and there is no rollback: a failure partway
//! leaves the earlier transactions committed on-chain, and the stored record
//! keeps a best-effort status trail instead.

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::chain::abi::{self, AbiError};
use crate::chain::contracts::{EncryptedErc, Erc20, Vault};
use crate::chain::rpc::LogEntry;
use crate::chain::{ChainClient, ChainError};
use crate::store::{Deposit, DepositStatus, Store, StoreError, WageGroup};

/// keccak256("Transfer(address,address,uint256)")
const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Stablecoin precision (USDC-style six decimals).
const STABLECOIN_DECIMALS: u32 = 6;

#[derive(Error, Debug)]
pub enum DepositError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error("could not determine shares received from the vault deposit")]
    SharesNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct DepositService {
    chain: ChainClient,
    stablecoin: String,
    encrypted_erc: String,
}

impl DepositService {
    pub fn new(chain: ChainClient, stablecoin: String, encrypted_erc: String) -> Self {
        Self {
            chain,
            stablecoin,
            encrypted_erc,
        }
    }

    /// Run the full pipeline for one wage-group top-up.
    #[instrument(skip(self, store, group), fields(wage_group = %group.id, %vault_address))]
    pub async fn run(
        &self,
        store: &Store,
        owner_id: Uuid,
        group: &WageGroup,
        from: &str,
        amount: f64,
        vault_address: &str,
    ) -> Result<Deposit, DepositError> {
        let units = to_stablecoin_units(amount);
        let stablecoin = Erc20::new(&self.chain, &self.stablecoin);
        let vault = Vault::new(&self.chain, vault_address);
        let encrypted = EncryptedErc::new(&self.chain, &self.encrypted_erc);
        let yield_source = group.yield_source.as_deref().unwrap_or_default();

        // 1. Approve the vault to pull the stablecoin.
        let approve = stablecoin.approve_calldata(vault_address, units)?;
        let tx = self
            .chain
            .send_as(from, &self.stablecoin, &approve, None)
            .await?;
        self.chain.wait_for_receipt(&tx).await?;
        info!(%tx, "stablecoin approved");

        // 2. Deposit into the vault.
        let deposit_call = vault.deposit_calldata(units, from)?;
        let tx = self
            .chain
            .send_as(from, vault_address, &deposit_call, None)
            .await?;
        let receipt = self.chain.wait_for_receipt(&tx).await?;
        info!(%tx, "vault deposit confirmed");

        // 3. The shares minted to the depositor come out of the vault's own
        //    Transfer event.
        let shares = parse_shares(&receipt.logs, vault_address, from)
            .ok_or(DepositError::SharesNotFound)?;
        info!(shares, "vault shares received");

        // 4. Record before the confidential leg so a later failure still
        //    leaves an auditable row.
        let deposit = store
            .create_deposit(
                owner_id,
                group.id,
                &receipt.transaction_hash,
                amount,
                &shares.to_string(),
                yield_source,
                DepositStatus::PendingConfidential,
            )
            .await;

        // 5. Approve the encrypted contract to pull the shares.
        let share_approve = vault.approve_calldata(&self.encrypted_erc, shares)?;
        if let Err(e) = self.confirm(from, vault_address, &share_approve).await {
            self.mark_failed(store, deposit.id, "share approval failed").await;
            return Err(e);
        }

        // 6. Confidential deposit of the shares.
        let eerc_call = encrypted.deposit_calldata(shares);
        let eerc_tx = match self.confirm(from, &self.encrypted_erc, &eerc_call).await {
            Ok(tx) => tx,
            Err(e) => {
                self.mark_failed(store, deposit.id, "encrypted deposit failed").await;
                return Err(e);
            }
        };
        info!(%eerc_tx, "encrypted deposit confirmed");

        // 7. Finalize.
        let deposit = store
            .update_deposit(
                deposit.id,
                Some(DepositStatus::Completed),
                Some(&eerc_tx),
                Some("confirmed"),
            )
            .await?;

        Ok(deposit)
    }

    async fn confirm(&self, from: &str, to: &str, data: &str) -> Result<String, DepositError> {
        let tx = self.chain.send_as(from, to, data, None).await?;
        self.chain.wait_for_receipt(&tx).await?;
        Ok(tx)
    }

    async fn mark_failed(&self, store: &Store, deposit_id: Uuid, reason: &str) {
        if let Err(e) = store
            .update_deposit(deposit_id, Some(DepositStatus::Failed), None, Some(reason))
            .await
        {
            warn!(%deposit_id, error = %e, "failed to record deposit failure");
        }
    }
}

/// Find the vault's Transfer event that minted shares to `receiver` and
/// return the amount word.
pub fn parse_shares(logs: &[LogEntry], vault: &str, receiver: &str) -> Option<u128> {
    let receiver_suffix = receiver
        .strip_prefix("0x")
        .unwrap_or(receiver)
        .to_ascii_lowercase();

    for log in logs {
        if !log.address.eq_ignore_ascii_case(vault) {
            continue;
        }
        let Some(topic0) = log.topics.first() else {
            continue;
        };
        if !topic0.eq_ignore_ascii_case(TRANSFER_TOPIC) {
            continue;
        }
        let Some(to_topic) = log.topics.get(2) else {
            continue;
        };
        if to_topic.to_ascii_lowercase().ends_with(&receiver_suffix) {
            return abi::parse_quantity(&log.data).ok();
        }
    }
    None
}

fn to_stablecoin_units(amount: f64) -> u128 {
    (amount * 10f64.powi(STABLECOIN_DECIMALS as i32)).floor() as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: &str = "0x39de0f00189306062d79edec6dca5bb6bfd108f9";
    const USER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn transfer_log(address: &str, to_word: &str, data: &str) -> LogEntry {
        LogEntry {
            address: address.to_string(),
            topics: vec![
                TRANSFER_TOPIC.to_string(),
                format!("0x{:0>64}", "0"),
                to_word.to_string(),
            ],
            data: data.to_string(),
        }
    }

    #[test]
    fn shares_come_from_the_vault_transfer_to_the_depositor() {
        let to_word = format!("0x000000000000000000000000{}", &USER.to_lowercase()[2..]);
        let logs = vec![
            // Unrelated token transfer in the same receipt.
            transfer_log("0x0000000000000000000000000000000000000001", &to_word, "0x01"),
            transfer_log(VAULT, &to_word, &format!("0x{:064x}", 250_000_000u64)),
        ];
        assert_eq!(parse_shares(&logs, VAULT, USER), Some(250_000_000));
    }

    #[test]
    fn transfer_to_someone_else_is_ignored() {
        let other = format!("0x{:0>64}", "beef");
        let logs = vec![transfer_log(VAULT, &other, "0x01")];
        assert_eq!(parse_shares(&logs, VAULT, USER), None);
    }

    #[test]
    fn missing_topics_are_ignored() {
        let logs = vec![LogEntry {
            address: VAULT.to_string(),
            topics: vec![],
            data: "0x01".to_string(),
        }];
        assert_eq!(parse_shares(&logs, VAULT, USER), None);
    }

    #[test]
    fn stablecoin_units_floor_fractional_dust() {
        assert_eq!(to_stablecoin_units(1.0), 1_000_000);
        assert_eq!(to_stablecoin_units(0.1234567), 123_456);
        assert_eq!(to_stablecoin_units(250.5), 250_500_000);
    }
}
