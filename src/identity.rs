//! Credential persistence.
//!
//! The credential file is written once by `keygen` and read by every other
//! workflow. A missing file means no identity is configured, which callers
//! treat as a silent no-op rather than a failure.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Mnemonic and the address derived from it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub mnemonic: String,
    pub address: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Whether a signing identity is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Absent,
    Present(Credential),
}

/// Errors reading or writing the credential file.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Could not access credential file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credential file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Identity {
    /// Load the identity stored at `path`.
    ///
    /// A missing file or an empty mnemonic yields [`Identity::Absent`].
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Identity::Absent),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        #[derive(Deserialize)]
        struct StoredCredential {
            #[serde(default)]
            mnemonic: String,
            #[serde(default)]
            address: String,
        }

        let stored: StoredCredential =
            serde_json::from_str(&content).map_err(|source| CredentialError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        if stored.mnemonic.trim().is_empty() {
            return Ok(Identity::Absent);
        }

        Ok(Identity::Present(Credential {
            mnemonic: stored.mnemonic,
            address: stored.address,
        }))
    }
}

/// Persist a credential as JSON, replacing any existing file.
pub fn save_credential(path: &Path, credential: &Credential) -> Result<(), CredentialError> {
    let io_err = |source| CredentialError::Io {
        path: path.display().to_string(),
        source,
    };
    let json = serde_json::to_string_pretty(credential).map_err(|source| {
        CredentialError::Parse {
            path: path.display().to_string(),
            source,
        }
    })?;
    fs::write(path, json).map_err(io_err)
}
