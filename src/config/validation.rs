//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (max_size, numeric fee strings)
//! - Check the endpoint and derivation path are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CliConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{CliConfig, StdFee};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &CliConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.network.endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "network.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("network.endpoint", e.to_string())),
    }

    let prefix = &config.network.address_prefix;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            "network.address_prefix",
            "must be non-empty lowercase alphanumeric",
        ));
    }

    if !config.network.derivation_path.starts_with("m/") {
        errors.push(ValidationError::new(
            "network.derivation_path",
            "must start with 'm/'",
        ));
    }

    if !(1..=u16::MAX as u32).contains(&config.contract.max_size) {
        errors.push(ValidationError::new(
            "contract.max_size",
            "must be in the range 1..=65535",
        ));
    }

    for (name, fee) in config.fees.entries() {
        validate_fee(&format!("fees.{}", name), fee, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_fee(field: &str, fee: &StdFee, errors: &mut Vec<ValidationError>) {
    if !is_decimal(&fee.gas) {
        errors.push(ValidationError::new(
            format!("{}.gas", field),
            format!("'{}' is not a decimal integer", fee.gas),
        ));
    }
    for (i, coin) in fee.amount.iter().enumerate() {
        if !is_decimal(&coin.amount) {
            errors.push(ValidationError::new(
                format!("{}.amount[{}].amount", field, i),
                format!("'{}' is not a decimal integer", coin.amount),
            ));
        }
        if coin.denom.is_empty() {
            errors.push(ValidationError::new(
                format!("{}.amount[{}].denom", field, i),
                "must not be empty",
            ));
        }
    }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
