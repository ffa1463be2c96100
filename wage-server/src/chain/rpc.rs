//! JSON-RPC client
//!
//! The deployment target is an anvil fork, so alongside the standard
//! `eth_*` calls this client exposes the node-management methods the
//! faucet and transaction submission rely on (impersonation, balance
//! setting).

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transaction reverted: {0}")]
    Reverted(String),
    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(String),
    #[error("malformed rpc response: {0}")]
    InvalidResponse(String),
}

/// The subset of a transaction receipt the server reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub status: String,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == "0x1"
    }
}

#[derive(Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    url: String,
    receipt_timeout: Duration,
}

impl ChainClient {
    pub fn new(url: impl Into<String>, receipt_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            receipt_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    /// Raw JSON-RPC call.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        debug!(method, "rpc call");
        let response: Value = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1,
            }))
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(ChainError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse("missing result".to_string()))
    }

    /// `eth_call` against latest state, returning the raw hex result.
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<String, ChainError> {
        let result = self
            .call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::InvalidResponse("eth_call result not a string".into()))
    }

    /// Submit a transaction from an unlocked (or impersonated) account.
    pub async fn send_transaction(
        &self,
        from: &str,
        to: &str,
        data: &str,
        gas: Option<u64>,
    ) -> Result<String, ChainError> {
        let mut tx = json!({ "from": from, "to": to, "data": data });
        if let Some(gas) = gas {
            tx["gas"] = json!(format!("0x{gas:x}"));
        }
        let result = self.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::InvalidResponse("tx hash not a string".into()))
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TxReceipt>, ChainError> {
        let result = self
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Poll until the transaction is mined, then require success.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                if receipt.succeeded() {
                    return Ok(receipt);
                }
                return Err(ChainError::Reverted(tx_hash.to_string()));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ChainError::ReceiptTimeout(tx_hash.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    // -------- anvil node management --------

    pub async fn impersonate(&self, address: &str) -> Result<(), ChainError> {
        self.call("anvil_impersonateAccount", json!([address]))
            .await?;
        Ok(())
    }

    pub async fn stop_impersonating(&self, address: &str) -> Result<(), ChainError> {
        self.call("anvil_stopImpersonatingAccount", json!([address]))
            .await?;
        Ok(())
    }

    pub async fn set_balance(&self, address: &str, wei: u128) -> Result<(), ChainError> {
        self.call("anvil_setBalance", json!([address, format!("0x{wei:x}")]))
            .await?;
        Ok(())
    }

    /// Send a transaction from an account the node does not hold the key
    /// for: impersonate, send, always stop impersonating.
    pub async fn send_as(
        &self,
        from: &str,
        to: &str,
        data: &str,
        gas: Option<u64>,
    ) -> Result<String, ChainError> {
        self.impersonate(from).await?;
        let sent = self.send_transaction(from, to, data, gas).await;
        if let Err(e) = self.stop_impersonating(from).await {
            debug!(error = %e, "failed to stop impersonating");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_status_parsing() {
        let raw = serde_json::json!({
            "transactionHash": "0xabc",
            "status": "0x1",
            "logs": [{"address": "0xdef", "topics": ["0x1"], "data": "0x00"}],
        });
        let receipt: TxReceipt = serde_json::from_value(raw).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.logs.len(), 1);
    }

    #[test]
    fn failed_receipt_is_not_success() {
        let raw = serde_json::json!({ "transactionHash": "0xabc", "status": "0x0" });
        let receipt: TxReceipt = serde_json::from_value(raw).unwrap();
        assert!(!receipt.succeeded());
        assert!(receipt.logs.is_empty());
    }
}
