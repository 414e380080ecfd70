//! Score contract CLI library: credentials, chain client and workflows.

pub mod chain;
pub mod config;
pub mod contract;
pub mod identity;
pub mod observability;
pub mod workflows;

pub use config::schema::CliConfig;
pub use identity::{Credential, Identity};
pub use workflows::{BootstrapWorkflow, InteractionWorkflow, Outcome, WorkflowError};
