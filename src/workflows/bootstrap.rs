//! Contract bootstrap: upload bytecode, then instantiate it.
//!
//! Steps run strictly in order and each is gated on the previous one. A
//! failed instantiation leaves the uploaded code on chain; nothing is rolled
//! back.

use std::fs;
use std::path::PathBuf;

use crate::chain::types::UploadOptions;
use crate::chain::{ChainClient, ClientFactory};
use crate::config::schema::CliConfig;
use crate::contract::{contract_label, ContractRecord, InitMsg};
use crate::identity::Identity;
use crate::workflows::{Outcome, WorkflowError};

/// Uploads and instantiates the score contract.
#[derive(Debug, Clone)]
pub struct BootstrapWorkflow<F> {
    factory: F,
    bytecode: PathBuf,
    max_size: u32,
}

impl<F: ClientFactory> BootstrapWorkflow<F> {
    pub fn new(config: &CliConfig, factory: F) -> Self {
        Self {
            factory,
            bytecode: config.paths.bytecode.clone(),
            max_size: config.contract.max_size,
        }
    }

    /// Override the bytecode location.
    pub fn with_bytecode(mut self, path: impl Into<PathBuf>) -> Self {
        self.bytecode = path.into();
        self
    }

    pub async fn run(&self, identity: &Identity) -> Result<Outcome<ContractRecord>, WorkflowError> {
        let credential = match identity {
            Identity::Absent => {
                tracing::info!("No credential configured, skipping deploy");
                return Ok(Outcome::Skipped);
            }
            Identity::Present(credential) => credential,
        };

        let wasm = fs::read(&self.bytecode).map_err(|source| WorkflowError::Bytecode {
            path: self.bytecode.display().to_string(),
            source,
        })?;

        let client = self
            .factory
            .connect(credential)
            .map_err(WorkflowError::Client)?;

        tracing::info!(bytes = wasm.len(), "Uploading contract");
        let receipt = client
            .upload(&wasm, UploadOptions::default())
            .await
            .map_err(WorkflowError::Upload)?;
        let code_id = receipt.code_id;

        tracing::info!(code_id = code_id.0, "Received upload receipt, instantiating contract");
        let init_msg = serde_json::to_value(InitMsg {
            max_size: self.max_size,
        })
        .map_err(WorkflowError::Encode)?;
        let label = contract_label(client.address());
        let contract = client
            .instantiate(code_id, &init_msg, &label)
            .await
            .map_err(WorkflowError::Instantiate)?;

        tracing::info!(
            contract_address = %contract.contract_address,
            code_id = code_id.0,
            "Contract instantiated"
        );

        Ok(Outcome::Completed(ContractRecord {
            contract_address: contract.contract_address,
            code_id: Some(code_id.0),
        }))
    }
}
