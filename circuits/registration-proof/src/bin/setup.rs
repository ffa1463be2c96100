//! Generates the registration circuit artifacts.
//!
//! ```bash
//! cargo run --release --bin setup-registration -- artifacts/
//! ```
//!
//! Writes `registration.pk` and `registration.vk` into the given directory
//! (default `artifacts/`). The server loads them from `ARTIFACTS_DIR`.

use rand::rngs::OsRng;
use registration_proof::RegistrationProver;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    eprintln!("Running Groth16 circuit-specific setup...");
    let prover = RegistrationProver::generate(&mut OsRng)?;

    prover.write_artifacts(&dir)?;
    eprintln!(
        "Wrote registration.pk and registration.vk to {}",
        dir.display()
    );

    Ok(())
}
