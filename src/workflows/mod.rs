//! Contract workflows.
//!
//! # Lifecycle
//! ```text
//! Uninitialized ──(credential loaded)──▶ Ready ──(operation)──▶ Completed | Failed
//!       │
//!       └──(no credential)──▶ Skipped
//! ```
//!
//! Every invocation starts from scratch; nothing is resumed or retried.

pub mod bootstrap;
pub mod interaction;
pub mod keygen;

use thiserror::Error;

use crate::chain::ChainError;
use crate::contract::ContractRecordError;
use crate::identity::CredentialError;

pub use bootstrap::BootstrapWorkflow;
pub use interaction::{InteractionWorkflow, SubmitReport};
pub use keygen::run_keygen;

/// Result of a workflow that may be skipped for lack of an identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// No credential configured; nothing was done.
    Skipped,
    Completed(T),
}

impl<T> Outcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// Errors that abort a workflow, each carrying the step that failed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    ContractRecord(#[from] ContractRecordError),

    #[error("Could not read bytecode {path}: {source}")]
    Bytecode {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not build chain client: {0}")]
    Client(ChainError),

    #[error("Could not upload contract: {0}")]
    Upload(ChainError),

    #[error("Could not instantiate contract: {0}")]
    Instantiate(ChainError),

    #[error("Could not query contract: {0}")]
    Query(ChainError),

    #[error("Could not execute contract: {0}")]
    Execute(ChainError),

    #[error("Could not encode contract message: {0}")]
    Encode(serde_json::Error),

    #[error("Unexpected contract response: {0}")]
    Response(serde_json::Error),
}
