//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the CLI.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the CLI.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Network endpoint and key derivation parameters.
    pub network: NetworkConfig,

    /// Local files read and written by the workflows.
    pub paths: PathsConfig,

    /// Contract instantiation parameters.
    pub contract: ContractConfig,

    /// Per-operation fee schedule.
    pub fees: FeeSchedule,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the REST gateway.
    pub endpoint: String,

    /// Bech32 human-readable prefix of account addresses.
    pub address_prefix: String,

    /// BIP-32 path the signing key is derived along.
    pub derivation_path: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://testnet.securesecrets.org:1317/".to_string(),
            address_prefix: "secret".to_string(),
            derivation_path: "m/44'/529'/0'/0/0".to_string(),
        }
    }
}

/// Local file locations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Credential file written by `keygen`.
    pub credentials: PathBuf,

    /// Contract record file read by `query` and `submit`.
    pub contract_record: PathBuf,

    /// Compiled contract bytecode.
    pub bytecode: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from("keys.json"),
            contract_record: PathBuf::from("contract.json"),
            bytecode: PathBuf::from("contract.wasm"),
        }
    }
}

/// Contract instantiation settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ContractConfig {
    /// `max_size` sent in the init message.
    pub max_size: u32,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self { max_size: 1000 }
    }
}

/// A single denomination amount.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Coin {
    /// Integer amount as a decimal string.
    pub amount: String,
    pub denom: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            denom: denom.into(),
        }
    }
}

/// Fee attached to a single transaction.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    /// Gas limit as a decimal string.
    pub gas: String,
}

impl StdFee {
    fn uscrt(amount: &str, gas: &str) -> Self {
        Self {
            amount: vec![Coin::new(amount, "uscrt")],
            gas: gas.to_string(),
        }
    }
}

/// Fees for each kind of transaction the client sends.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeeSchedule {
    pub upload: StdFee,
    pub init: StdFee,
    pub exec: StdFee,
    pub send: StdFee,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            upload: StdFee::uscrt("2500000", "10000000"),
            init: StdFee::uscrt("2500000", "10000000"),
            exec: StdFee::uscrt("500000", "500000"),
            send: StdFee::uscrt("80000", "80000"),
        }
    }
}

impl FeeSchedule {
    /// Iterate over `(operation, fee)` pairs.
    pub fn entries(&self) -> [(&'static str, &StdFee); 4] {
        [
            ("upload", &self.upload),
            ("init", &self.init),
            ("exec", &self.exec),
            ("send", &self.send),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
