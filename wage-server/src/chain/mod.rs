//! Chain collaborators
//!
//! JSON-RPC access to the dev-fork node, manual ABI encoding for the handful
//! of contract calls the server makes, and thin typed wrappers per contract.

pub mod abi;
pub mod contracts;
pub mod rpc;

pub use contracts::{EncryptedErc, Erc20, Registrar, Vault};
pub use rpc::{ChainClient, ChainError, TxReceipt};
