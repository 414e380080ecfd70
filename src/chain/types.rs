//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export fee types from config module to avoid duplication
pub use crate::config::schema::{Coin, FeeSchedule, StdFee};

/// Chain-assigned identifier of uploaded bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeId(pub u64);

impl From<u64> for CodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport-level failure talking to the gateway.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status.
    #[error("Gateway returned status {status}: {body}")]
    Gateway { status: u16, body: String },

    /// Transaction was included but failed on-chain.
    #[error("Transaction failed with code {code}: {raw_log}")]
    Tx { code: u32, raw_log: String },

    /// Invalid mnemonic, derivation path or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Malformed payload in either direction.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Expected event attribute absent from the tx logs.
    #[error("Attribute '{0}' not found in transaction logs")]
    MissingAttribute(&'static str),

    /// Endpoint could not be parsed.
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<serde_json::Error> for ChainError {
    fn from(e: serde_json::Error) -> Self {
        ChainError::Encoding(e.to_string())
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Extra metadata attached to an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// URL of the source code, if published.
    pub source: Option<String>,
    /// Docker image the bytecode was built with.
    pub builder: Option<String>,
}

/// Receipt returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub code_id: CodeId,
    pub transaction_hash: String,
}

/// Receipt returned by a successful instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateReceipt {
    pub contract_address: String,
    pub transaction_hash: String,
}

/// Receipt returned by a successful execution.
///
/// `data` is the opaque response payload emitted by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecuteReceipt {
    pub data: Vec<u8>,
    pub transaction_hash: String,
}
