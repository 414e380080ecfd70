//! Transaction building, signing, and broadcast result parsing.
//!
//! # Responsibilities
//! - Build amino JSON contract messages
//! - Produce canonical sign bytes (sorted keys, compact JSON)
//! - Assemble the signed `StdTx`
//! - Interpret the gateway's broadcast response

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::chain::types::{ChainError, ChainResult, CodeId, StdFee, UploadOptions};

const PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

/// Account number and sequence needed to sign a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub sequence: u64,
}

/// `GET /auth/accounts/{address}` response body.
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub result: AccountEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct AccountEnvelope {
    pub value: AccountInfo,
}

/// `GET /node_info` response body.
#[derive(Debug, Deserialize)]
pub struct NodeInfoResponse {
    pub node_info: NodeInfo,
}

#[derive(Debug, Deserialize)]
pub struct NodeInfo {
    /// Chain id.
    pub network: String,
}

/// `GET /wasm/contract/{address}/query/...` response body.
#[derive(Debug, Deserialize)]
pub struct SmartQueryResponse {
    pub result: SmartQueryResult,
}

#[derive(Debug, Deserialize)]
pub struct SmartQueryResult {
    /// Base64 of the sealed contract response.
    pub smart: String,
}

/// `GET /reg/consensus-io-exch-pubkey` response body.
#[derive(Debug, Deserialize)]
pub struct ConsensusIoKeyResponse {
    pub result: ConsensusIoKey,
}

#[derive(Debug, Deserialize)]
pub struct ConsensusIoKey {
    /// Base64 x25519 public key of the enclave.
    #[serde(rename = "ioExchPubkey")]
    pub io_exch_pubkey: String,
}

/// `GET /wasm/code/{id}/hash` and `GET /wasm/contract/{address}/code-hash`.
#[derive(Debug, Deserialize)]
pub struct CodeHashResponse {
    /// Hex SHA-256 of the contract bytecode.
    pub result: String,
}

/// `POST /txs` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastResponse {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub logs: Vec<TxLog>,
    /// Hex-encoded result data.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxLog {
    #[serde(default)]
    pub events: Vec<TxEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<TxAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl BroadcastResponse {
    /// Turn a non-zero result code into an error.
    pub fn into_result(self) -> ChainResult<Self> {
        if self.code != 0 {
            return Err(ChainError::Tx {
                code: self.code,
                raw_log: self.raw_log,
            });
        }
        Ok(self)
    }

    /// First value of an event attribute across all logs.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.logs
            .iter()
            .flat_map(|log| &log.events)
            .flat_map(|event| &event.attributes)
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    /// Decode the hex `data` field; empty when absent.
    pub fn data_bytes(&self) -> ChainResult<Vec<u8>> {
        match self.data.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(hex_data) => hex::decode(hex_data)
                .map_err(|e| ChainError::Encoding(format!("Invalid tx data: {}", e))),
        }
    }

    pub fn code_id(&self) -> ChainResult<CodeId> {
        let raw = self
            .attribute("code_id")
            .ok_or(ChainError::MissingAttribute("code_id"))?;
        raw.parse::<u64>()
            .map(CodeId)
            .map_err(|e| ChainError::Encoding(format!("Invalid code_id '{}': {}", raw, e)))
    }

    pub fn contract_address(&self) -> ChainResult<String> {
        self.attribute("contract_address")
            .map(str::to_string)
            .ok_or(ChainError::MissingAttribute("contract_address"))
    }
}

pub fn store_code_msg(sender: &str, wasm: &[u8], opts: &UploadOptions) -> Value {
    json!({
        "type": "wasm/MsgStoreCode",
        "value": {
            "builder": opts.builder.as_deref().unwrap_or(""),
            "sender": sender,
            "source": opts.source.as_deref().unwrap_or(""),
            "wasm_byte_code": STANDARD.encode(wasm),
        }
    })
}

pub fn instantiate_msg(sender: &str, code_id: CodeId, label: &str, init_msg: &[u8]) -> Value {
    json!({
        "type": "wasm/MsgInstantiateContract",
        "value": {
            "callback_code_hash": "",
            "callback_sig": null,
            "code_id": code_id.0.to_string(),
            "init_funds": [],
            "init_msg": STANDARD.encode(init_msg),
            "label": label,
            "sender": sender,
        }
    })
}

pub fn execute_msg(sender: &str, contract: &str, msg: &[u8]) -> Value {
    json!({
        "type": "wasm/MsgExecuteContract",
        "value": {
            "callback_code_hash": "",
            "callback_sig": null,
            "contract": contract,
            "msg": STANDARD.encode(msg),
            "sender": sender,
            "sent_funds": [],
        }
    })
}

/// Path segment carrying a sealed smart query: hex of the base64 payload.
pub fn query_path_segment(sealed: &[u8]) -> String {
    hex::encode(STANDARD.encode(sealed))
}

/// Replace the encrypted part of a contract error log with its plaintext.
///
/// Contract failures are reported as
/// `... encrypted: <base64>: execute contract failed`. Logs without that
/// marker, or whose payload cannot be opened, are returned unchanged.
pub fn decrypt_raw_log<F>(raw_log: &str, open: F) -> String
where
    F: Fn(&[u8]) -> ChainResult<Vec<u8>>,
{
    const MARKER: &str = "encrypted: ";
    let Some(start) = raw_log.find(MARKER).map(|i| i + MARKER.len()) else {
        return raw_log.to_string();
    };
    let end = raw_log[start..]
        .find(':')
        .map_or(raw_log.len(), |i| start + i);
    let encoded = &raw_log[start..end];

    let plain = STANDARD
        .decode(encoded)
        .map_err(|e| ChainError::Encoding(e.to_string()))
        .and_then(|cipher| open(&cipher));
    match plain {
        Ok(plain) => raw_log.replacen(encoded, &String::from_utf8_lossy(&plain), 1),
        Err(_) => raw_log.to_string(),
    }
}

/// Canonical bytes the account key signs.
///
/// Amino JSON requires sorted keys; every object literal in this module is
/// written in sorted order.
pub fn sign_bytes(
    chain_id: &str,
    account: &AccountInfo,
    fee: &StdFee,
    msgs: &[Value],
    memo: &str,
) -> ChainResult<Vec<u8>> {
    let doc = json!({
        "account_number": account.account_number.to_string(),
        "chain_id": chain_id,
        "fee": serde_json::to_value(fee)?,
        "memo": memo,
        "msgs": msgs,
        "sequence": account.sequence.to_string(),
    });
    Ok(serde_json::to_vec(&doc)?)
}

/// Assemble the signed transaction body.
pub fn std_tx(
    msgs: Vec<Value>,
    fee: &StdFee,
    public_key: &[u8],
    signature: &[u8],
    memo: &str,
) -> ChainResult<Value> {
    Ok(json!({
        "msg": msgs,
        "fee": serde_json::to_value(fee)?,
        "signatures": [{
            "pub_key": {
                "type": PUBKEY_TYPE,
                "value": STANDARD.encode(public_key),
            },
            "signature": STANDARD.encode(signature),
        }],
        "memo": memo,
    }))
}

fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FeeSchedule;

    #[test]
    fn test_sign_bytes_are_sorted_and_compact() {
        let fee = FeeSchedule::default().exec;
        let account = AccountInfo {
            account_number: 7,
            sequence: 3,
        };
        let msg = execute_msg("secret1sender", "secret1contract", b"{}");
        let bytes = sign_bytes("holodeck-2", &account, &fee, &[msg], "").unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with(
            r#"{"account_number":"7","chain_id":"holodeck-2","fee":{"amount":[{"amount":"500000","denom":"uscrt"}],"gas":"500000"},"memo":"","msgs":[{"type":"wasm/MsgExecuteContract","value":{"callback_code_hash":"","callback_sig":null,"contract":"secret1contract""#
        ));
        assert!(text.ends_with(r#""sequence":"3"}"#));
        assert!(!text.contains(' '));
    }

    #[test]
    fn test_account_accepts_strings_and_numbers() {
        let body = r#"{"height":"10","result":{"type":"cosmos-sdk/Account","value":{"address":"secret1x","account_number":"12","sequence":4}}}"#;
        let parsed: AccountResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.result.value,
            AccountInfo {
                account_number: 12,
                sequence: 4
            }
        );
    }

    #[test]
    fn test_new_account_defaults_to_zero() {
        let body = r#"{"result":{"type":"cosmos-sdk/Account","value":{"address":""}}}"#;
        let parsed: AccountResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.value.sequence, 0);
    }

    #[test]
    fn test_broadcast_attributes() {
        let body = r#"{
            "height": "100",
            "txhash": "ABCD",
            "logs": [{"msg_index": 0, "log": "", "events": [
                {"type": "message", "attributes": [
                    {"key": "action", "value": "instantiate"},
                    {"key": "contract_address", "value": "secret1contract"},
                    {"key": "code_id", "value": "17"}
                ]}
            ]}]
        }"#;
        let response: BroadcastResponse = serde_json::from_str(body).unwrap();
        let response = response.into_result().unwrap();
        assert_eq!(response.code_id().unwrap(), CodeId(17));
        assert_eq!(response.contract_address().unwrap(), "secret1contract");
        assert!(response.data_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_broadcast_failure_code() {
        let body = r#"{"txhash": "EF01", "code": 5, "raw_log": "insufficient fees"}"#;
        let response: BroadcastResponse = serde_json::from_str(body).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, ChainError::Tx { code: 5, .. }));
    }

    #[test]
    fn test_missing_attribute() {
        let body = r#"{"txhash": "EF01", "logs": []}"#;
        let response: BroadcastResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.code_id(),
            Err(ChainError::MissingAttribute("code_id"))
        ));
    }

    #[test]
    fn test_data_bytes_decodes_hex() {
        let response = BroadcastResponse {
            txhash: "01".to_string(),
            code: 0,
            raw_log: String::new(),
            logs: Vec::new(),
            data: Some(hex::encode("Score recorded!")),
        };
        assert_eq!(response.data_bytes().unwrap(), b"Score recorded!");
    }

    #[test]
    fn test_code_hash_and_io_key_responses() {
        let hash: CodeHashResponse =
            serde_json::from_str(r#"{"height":"5","result":"af01"}"#).unwrap();
        assert_eq!(hash.result, "af01");

        let key: ConsensusIoKeyResponse = serde_json::from_str(
            r#"{"height":"5","result":{"ioExchPubkey":"AAAA"}}"#,
        )
        .unwrap();
        assert_eq!(key.result.io_exch_pubkey, "AAAA");
    }

    #[test]
    fn test_query_path_segment_is_hex_of_base64() {
        let segment = query_path_segment(&[0xff, 0x00]);
        assert_eq!(segment, hex::encode("/wA="));
    }

    #[test]
    fn test_decrypt_raw_log_replaces_payload() {
        let cipher = STANDARD.encode(b"sealed");
        let raw_log = format!(
            "failed to execute message; message index: 0: encrypted: {}: execute contract failed",
            cipher
        );
        let opened = decrypt_raw_log(&raw_log, |bytes| {
            assert_eq!(bytes, b"sealed");
            Ok(b"score out of range".to_vec())
        });
        assert_eq!(
            opened,
            "failed to execute message; message index: 0: score out of range: execute contract failed"
        );
    }

    #[test]
    fn test_decrypt_raw_log_leaves_other_logs() {
        let open = |_: &[u8]| -> ChainResult<Vec<u8>> { Err(ChainError::Encoding("no".into())) };
        assert_eq!(decrypt_raw_log("out of gas", open), "out of gas");
        assert_eq!(
            decrypt_raw_log("encrypted: AAAA: execute contract failed", open),
            "encrypted: AAAA: execute contract failed"
        );
    }
}
