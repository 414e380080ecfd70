//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Credential file (mnemonic)
//!     → wallet.rs (key derivation, address, signing)
//!     → client.rs (client factory, gateway calls)
//!     → transaction.rs (build, sign, broadcast, parse logs)
//!     → encryption.rs (per-client seed, enclave payload sealing)
//! ```
//!
//! # Security Constraints
//! - Mnemonics and private keys are never logged
//! - One encryption seed per client instance
//! - No retries; the first failure is returned to the caller

pub mod client;
pub mod encryption;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, ClientFactory, LcdClient, LcdClientFactory};
pub use encryption::{EncryptionSeed, SealedMessage, TxCipher};
pub use types::{ChainError, ChainResult, CodeId};
pub use wallet::Wallet;
