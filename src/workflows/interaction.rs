//! Queries and executions against an already deployed contract.

use std::path::PathBuf;

use crate::chain::{ChainClient, ClientFactory};
use crate::config::schema::CliConfig;
use crate::contract::{
    format_submission_date, is_score_recorded, ContractRecord, HandleMsg, QueryMsg, ScoreRecord,
};
use crate::identity::{Credential, Identity};
use crate::workflows::{Outcome, WorkflowError};

/// What the contract answered to a score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    /// Whether the response confirmed the record.
    pub recorded: bool,
    /// Response bytes decoded as UTF-8.
    pub response: String,
    pub transaction_hash: String,
}

/// Reads and writes scores on the contract named in the contract record.
#[derive(Debug, Clone)]
pub struct InteractionWorkflow<F> {
    factory: F,
    contract_record: PathBuf,
}

impl<F: ClientFactory> InteractionWorkflow<F> {
    pub fn new(config: &CliConfig, factory: F) -> Self {
        Self {
            factory,
            contract_record: config.paths.contract_record.clone(),
        }
    }

    /// Connect and resolve the contract, or `None` without an identity.
    fn prepare<'a>(
        &self,
        identity: &'a Identity,
    ) -> Result<Option<(&'a Credential, F::Client, ContractRecord)>, WorkflowError> {
        let credential = match identity {
            Identity::Absent => return Ok(None),
            Identity::Present(credential) => credential,
        };
        let record = ContractRecord::load(&self.contract_record)?;
        let client = self
            .factory
            .connect(credential)
            .map_err(WorkflowError::Client)?;
        Ok(Some((credential, client, record)))
    }

    /// Fetch the score stored for the credential's address.
    pub async fn query(&self, identity: &Identity) -> Result<Outcome<ScoreRecord>, WorkflowError> {
        let Some((credential, client, record)) = self.prepare(identity)? else {
            tracing::info!("No credential configured, skipping query");
            return Ok(Outcome::Skipped);
        };

        let msg = serde_json::to_value(QueryMsg::GetScore {
            address: credential.address.clone(),
        })
        .map_err(WorkflowError::Encode)?;

        tracing::debug!(contract_address = %record.contract_address, "Querying score");
        let response = client
            .query_contract_smart(&record.contract_address, &msg)
            .await
            .map_err(WorkflowError::Query)?;
        let score: ScoreRecord =
            serde_json::from_value(response).map_err(WorkflowError::Response)?;

        Ok(Outcome::Completed(score))
    }

    /// Record a score and description on the contract.
    pub async fn submit(
        &self,
        identity: &Identity,
        score: u64,
        description: &str,
    ) -> Result<Outcome<SubmitReport>, WorkflowError> {
        let Some((_, client, record)) = self.prepare(identity)? else {
            tracing::info!("No credential configured, skipping submit");
            return Ok(Outcome::Skipped);
        };

        let msg = serde_json::to_value(HandleMsg::Record {
            score,
            description: description.to_string(),
        })
        .map_err(WorkflowError::Encode)?;

        tracing::debug!(contract_address = %record.contract_address, score, "Submitting score");
        let receipt = client
            .execute(&record.contract_address, &msg)
            .await
            .map_err(WorkflowError::Execute)?;

        let recorded = is_score_recorded(&receipt.data);
        if !recorded {
            tracing::warn!(
                tx_hash = %receipt.transaction_hash,
                "Contract response did not confirm the score was recorded"
            );
        }

        Ok(Outcome::Completed(SubmitReport {
            recorded,
            response: String::from_utf8_lossy(&receipt.data).into_owned(),
            transaction_hash: receipt.transaction_hash,
        }))
    }
}

/// Human-readable rendering of a queried score.
pub fn render_score(record: &ScoreRecord) -> String {
    format!(
        "Score Query Response:\nStatus: {}\nScore: {}\nDescription: {}\nDate Submitted: {}",
        record.status,
        record.score.map(|s| s.to_string()).unwrap_or_default(),
        record.description.as_deref().unwrap_or_default(),
        format_submission_date(record.timestamp)
    )
}
