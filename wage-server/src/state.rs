//! Application State
//!
//! Shared state for the server, accessible from all route handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chain::ChainClient;
use crate::config::Config;
use crate::services::{DepositService, ProverError, ProverService, RegistrarService};
use crate::store::Store;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Store,
    prover: ProverService,
    chain: ChainClient,
    registrar: RegistrarService,
    deposits: DepositService,
    total_proofs: AtomicU64,
    total_registrations: AtomicU64,
    total_deposits: AtomicU64,
    start_time: Instant,
}

impl AppState {
    /// Build the full service graph from configuration.
    pub fn new(config: Config) -> Result<Self, ProverError> {
        let prover = ProverService::new(&config)?;
        Ok(Self::assemble(config, prover))
    }

    /// Assemble state around an existing prover service (tests, dev tools).
    pub fn with_prover(config: Config, prover: ProverService) -> Self {
        Self::assemble(config, prover)
    }

    fn assemble(config: Config, prover: ProverService) -> Self {
        let chain = ChainClient::new(
            config.rpc_url.clone(),
            Duration::from_secs(config.receipt_timeout_secs),
        );
        let registrar = RegistrarService::new(chain.clone(), config.registrar_address.clone());
        let deposits = DepositService::new(
            chain.clone(),
            config.stablecoin_address.clone(),
            config.encrypted_erc_address.clone(),
        );
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: Store::new(),
                prover,
                chain,
                registrar,
                deposits,
                total_proofs: AtomicU64::new(0),
                total_registrations: AtomicU64::new(0),
                total_deposits: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn prover(&self) -> &ProverService {
        &self.inner.prover
    }

    pub fn chain(&self) -> &ChainClient {
        &self.inner.chain
    }

    pub fn registrar(&self) -> &RegistrarService {
        &self.inner.registrar
    }

    pub fn deposits(&self) -> &DepositService {
        &self.inner.deposits
    }

    pub fn total_proofs(&self) -> u64 {
        self.inner.total_proofs.load(Ordering::Relaxed)
    }

    pub fn increment_proofs(&self) {
        self.inner.total_proofs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_registrations(&self) -> u64 {
        self.inner.total_registrations.load(Ordering::Relaxed)
    }

    pub fn increment_registrations(&self) {
        self.inner.total_registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_deposits(&self) -> u64 {
        self.inner.total_deposits.load(Ordering::Relaxed)
    }

    pub fn increment_deposits(&self) {
        self.inner.total_deposits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
