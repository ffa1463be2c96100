//! # WageRail Server
//!
//! API server for WageRail: employers register email-addressed payees, fund
//! a shared stablecoin pool through yield vaults, and settle confidential
//! balances through an encrypted ERC token.
//!
//! ## Features
//!
//! - Wage group and payee management with a typed store
//! - Deterministic Baby Jubjub key derivation from wallet signatures
//! - Groth16 registration proofs with multi-strategy on-chain submission
//! - The approve -> vault-deposit -> encrypted-deposit funding pipeline
//! - Dev-fork faucet and circuit artifact serving
//!
//! ## Usage
//!
//! ```bash
//! # Development mode (mock proofs, no chain submission)
//! DEV_MODE=true cargo run
//!
//! # Production (requires artifacts from `setup-registration`)
//! ARTIFACTS_DIR=artifacts RPC_URL=http://127.0.0.1:8545 cargo run
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /health`, `GET /status`
//! - `POST /api/v1/register` - full registration flow
//! - `POST /api/v1/proofs`, `POST /api/v1/proofs/verify`
//! - `POST|GET /api/v1/wage-groups`, `PUT|DELETE /api/v1/wage-groups/{id}`
//! - `POST|GET /api/v1/deposits`, `PATCH /api/v1/deposits/{id}`
//! - `GET /api/v1/users/registration-status`
//! - `POST /api/v1/faucet`, `POST /api/v1/faucet/native`
//! - `GET /api/v1/artifacts/{path}`

use axum::http::{header, HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wage_server::config::Config;
use wage_server::routes::create_routes;
use wage_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = config.dev_mode,
        chain_id = config.chain_id,
        rpc_url = %config.rpc_url,
        "Starting WageRail server"
    );

    if config.dev_mode {
        info!("Running in DEVELOPMENT mode - proofs are MOCKED and nothing is submitted");
    }

    // Create application state (loads proving artifacts)
    let state = AppState::new(config.clone())?;

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-user-id"),
        ])
        .allow_origin(Any);

    // Build router
    let app = create_routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr();
    info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging based on configuration
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    }
}
