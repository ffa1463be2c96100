//! Services for the WageRail server
//!
//! Proof generation, registration submission, and the deposit pipeline.

pub mod deposit_flow;
pub mod prover;
pub mod registrar;

pub use deposit_flow::{DepositError, DepositService};
pub use prover::{GeneratedProof, ProverError, ProverService};
pub use registrar::{RegistrarService, RegistrationError, RegistrationOutcome};
