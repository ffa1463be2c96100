//! Server Configuration
//!
//! Everything comes from environment variables (a `.env` file is honored in
//! development). Contract addresses and the vault registry are deployment
//! configuration, never compile-time constants.

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// JSON-RPC endpoint of the chain node (an anvil fork in development)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain id registrations are bound to
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Registrar contract address
    #[serde(default)]
    pub registrar_address: String,

    /// Encrypted ERC contract address
    #[serde(default)]
    pub encrypted_erc_address: String,

    /// Stablecoin (USDC) contract address
    #[serde(default)]
    pub stablecoin_address: String,

    /// Named yield vaults: yield-source id -> vault address
    #[serde(default)]
    pub vaults: HashMap<String, String>,

    /// Account holding faucet funds on the fork
    #[serde(default)]
    pub faucet_whale: String,

    /// Maximum stablecoin units per faucet request
    #[serde(default = "default_faucet_cap")]
    pub faucet_cap: u64,

    /// Enable development mode (mock proofs, no chain submission)
    #[serde(default)]
    pub dev_mode: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum concurrent proof generations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_proofs: usize,

    /// Proof generation timeout in seconds
    #[serde(default = "default_proof_timeout")]
    pub proof_timeout_secs: u64,

    /// Transaction receipt wait timeout in seconds
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,

    /// Path to the circuit artifacts directory
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_id() -> u64 {
    43113
}

fn default_faucet_cap() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_concurrent() -> usize {
    4
}

fn default_proof_timeout() -> u64 {
    30
}

fn default_receipt_timeout() -> u64 {
    60
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            registrar_address: String::new(),
            encrypted_erc_address: String::new(),
            stablecoin_address: String::new(),
            vaults: HashMap::new(),
            faucet_whale: String::new(),
            faucet_cap: default_faucet_cap(),
            dev_mode: false,
            log_level: default_log_level(),
            json_logs: false,
            cors_origins: default_cors_origins(),
            max_concurrent_proofs: default_max_concurrent(),
            proof_timeout_secs: default_proof_timeout(),
            receipt_timeout_secs: default_receipt_timeout(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            rpc_url: std::env::var("RPC_URL").unwrap_or_else(|_| default_rpc_url()),
            chain_id: std::env::var("CHAIN_ID")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or_else(default_chain_id),
            registrar_address: std::env::var("REGISTRAR_ADDRESS").unwrap_or_default(),
            encrypted_erc_address: std::env::var("ENCRYPTED_ERC_ADDRESS").unwrap_or_default(),
            stablecoin_address: std::env::var("STABLECOIN_ADDRESS").unwrap_or_default(),
            vaults: std::env::var("VAULTS")
                .map(|s| parse_vaults(&s))
                .unwrap_or_default(),
            faucet_whale: std::env::var("FAUCET_WHALE").unwrap_or_default(),
            faucet_cap: std::env::var("FAUCET_CAP")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or_else(default_faucet_cap),
            dev_mode: std::env::var("DEV_MODE").unwrap_or_default() == "true",
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            json_logs: std::env::var("JSON_LOGS").unwrap_or_default() == "true",
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(String::from).collect())
                .unwrap_or_else(|_| default_cors_origins()),
            max_concurrent_proofs: std::env::var("MAX_CONCURRENT_PROOFS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_max_concurrent),
            proof_timeout_secs: std::env::var("PROOF_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_proof_timeout),
            receipt_timeout_secs: std::env::var("RECEIPT_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_receipt_timeout),
            artifacts_dir: std::env::var("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_artifacts_dir()),
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Look up a configured vault address by yield-source id
    pub fn vault_address(&self, yield_source: &str) -> Option<&str> {
        self.vaults.get(yield_source).map(String::as_str)
    }
}

/// Parse `name=address,name=address` vault registry syntax.
fn parse_vaults(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, address) = entry.split_once('=')?;
            let name = name.trim();
            let address = address.trim();
            if name.is_empty() || address.is_empty() {
                None
            } else {
                Some((name.to_string(), address.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_registry_parsing() {
        let vaults = parse_vaults("alpha=0xaa, beta=0xbb,=0xcc,broken");
        assert_eq!(vaults.len(), 2);
        assert_eq!(vaults["alpha"], "0xaa");
        assert_eq!(vaults["beta"], "0xbb");
    }

    #[test]
    fn default_config_is_consistent() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert!(config.vault_address("anything").is_none());
    }
}
