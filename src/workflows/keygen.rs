//! Key generation workflow.
//!
//! Failures here are reported as a message instead of an error so the
//! caller can print them alongside a successful result.

use crate::chain::wallet::generate_credential;
use crate::config::schema::CliConfig;
use crate::identity::{save_credential, Credential};

/// Generate a credential and write it to the configured credential file.
pub fn run_keygen(config: &CliConfig) -> Result<Credential, String> {
    let credential = generate_credential(
        &config.network.derivation_path,
        &config.network.address_prefix,
    )
    .map_err(|e| e.to_string())?;

    save_credential(&config.paths.credentials, &credential).map_err(|e| e.to_string())?;

    tracing::info!(
        address = %credential.address,
        path = %config.paths.credentials.display(),
        "Credential generated"
    );
    Ok(credential)
}
