//! Score contract message types and response interpretation.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Substring the contract puts in its execute response when a score is stored.
pub const SCORE_RECORDED: &str = "Score recorded";

/// Instantiation message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitMsg {
    pub max_size: u32,
}

/// State-mutating messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum HandleMsg {
    Record { score: u64, description: String },
}

/// Read-only queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    GetScore { address: String },
}

/// Score as returned by `get_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreRecord {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Milliseconds since the Unix epoch, assigned by the contract.
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Address of a deployed contract, as persisted after bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_id: Option<u64>,
}

/// Errors reading the contract record file.
#[derive(Debug, thiserror::Error)]
pub enum ContractRecordError {
    #[error("Could not read contract record {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed contract record {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ContractRecord {
    pub fn load(path: &Path) -> Result<Self, ContractRecordError> {
        let content = fs::read_to_string(path).map_err(|source| ContractRecordError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ContractRecordError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Whether an execute response confirms the score was stored.
pub fn is_score_recorded(response: &[u8]) -> bool {
    String::from_utf8_lossy(response).contains(SCORE_RECORDED)
}

/// Instantiation label: the account address without its first 6 characters.
pub fn contract_label(address: &str) -> String {
    address.chars().skip(6).collect()
}

/// Render a millisecond timestamp as an en-US date (`M/D/YYYY`, UTC).
///
/// Years are printed without sign or padding. Timestamps past
/// [`chrono::NaiveDate::MAX`] render as `Invalid Date`.
pub fn format_submission_date(timestamp: Option<u64>) -> String {
    timestamp
        .and_then(|ms| i64::try_from(ms).ok())
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| format!("{}/{}/{}", dt.month(), dt.day(), dt.year()))
        .unwrap_or_else(|| "Invalid Date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shapes() {
        let query = QueryMsg::GetScore {
            address: "secret1abc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&query).unwrap(),
            r#"{"get_score":{"address":"secret1abc"}}"#
        );

        let handle = HandleMsg::Record {
            score: 400,
            description: "FAIR".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&handle).unwrap(),
            r#"{"record":{"score":400,"description":"FAIR"}}"#
        );

        let init = InitMsg { max_size: 1000 };
        assert_eq!(serde_json::to_string(&init).unwrap(), r#"{"max_size":1000}"#);
    }

    #[test]
    fn test_score_recorded_predicate() {
        assert!(is_score_recorded(b"Score recorded"));
        assert!(is_score_recorded(br#"{"record":{"status":"Score recorded!"}}"#));
        assert!(!is_score_recorded(b"score recorded"));
        assert!(!is_score_recorded(b"Score not found."));
        assert!(!is_score_recorded(b""));
        assert!(!is_score_recorded(&[0xff, 0xfe]));
    }

    #[test]
    fn test_label_drops_first_six_chars() {
        assert_eq!(contract_label("secret1abcdefgh"), "1abcdefgh");
        assert_eq!(contract_label("secret1"), "1");
        assert_eq!(contract_label("secret"), "");
        assert_eq!(contract_label("sec"), "");
        assert_eq!(contract_label(""), "");
    }

    #[test]
    fn test_epoch_date() {
        assert_eq!(format_submission_date(Some(0)), "1/1/1970");
    }

    #[test]
    fn test_date_formatting() {
        // 2021-11-05T12:00:00Z
        assert_eq!(format_submission_date(Some(1_636_113_600_000)), "11/5/2021");
        assert_eq!(format_submission_date(None), "Invalid Date");
        assert_eq!(format_submission_date(Some(u64::MAX)), "Invalid Date");
    }

    fn millis(date: chrono::NaiveDate) -> u64 {
        let ms = date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();
        u64::try_from(ms).unwrap()
    }

    #[test]
    fn test_five_digit_years_are_unsigned() {
        let year_10000 = chrono::NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        assert_eq!(format_submission_date(Some(millis(year_10000))), "1/1/10000");

        let last = chrono::NaiveDate::MAX;
        assert_eq!(
            format_submission_date(Some(millis(last))),
            format!("12/31/{}", last.year())
        );
    }

    #[test]
    fn test_beyond_representable_range() {
        let last_day = millis(chrono::NaiveDate::MAX);
        assert_eq!(
            format_submission_date(Some(last_day + 86_400_000)),
            "Invalid Date"
        );
        assert_eq!(
            format_submission_date(Some(8_640_000_000_000_000)),
            "Invalid Date"
        );
    }

    #[test]
    fn test_contract_record_ignores_extra_fields() {
        let record: ContractRecord = serde_json::from_str(
            r#"{"contractAddress": "secret1contract", "transactionHash": "AB"}"#,
        )
        .unwrap();
        assert_eq!(record.contract_address, "secret1contract");
        assert_eq!(record.code_id, None);
    }

    #[test]
    fn test_score_record_partial_response() {
        let record: ScoreRecord =
            serde_json::from_str(r#"{"status": "Score not found."}"#).unwrap();
        assert_eq!(record.status, "Score not found.");
        assert_eq!(record.score, None);
        assert_eq!(record.timestamp, None);
    }
}
