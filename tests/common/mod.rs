//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use x25519_dalek::{PublicKey, StaticSecret};

use sibyl_cli::chain::types::{
    ExecuteReceipt, InstantiateReceipt, UploadOptions, UploadReceipt,
};
use sibyl_cli::chain::encryption::{derive_tx_key, siv_open, siv_seal};
use sibyl_cli::chain::{ChainClient, ChainError, ChainResult, ClientFactory, CodeId};
use sibyl_cli::Credential;

pub const PATH: &str = "m/44'/529'/0'/0/0";

/// Code hash the mock gateway reports for every code id and contract.
pub const CODE_HASH: &str = "0f3c2e8b94a1d7c65e20b18f4d9a7c3e61b5f08a2d4c9e7b3a1f6d0c8e5b2a97";

/// Unique path under the system temp dir.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sibyl-test-{}-{}", uuid::Uuid::new_v4(), name))
}

/// HTTP client that never routes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Credential derived from fixed entropy.
pub fn test_credential() -> Credential {
    sibyl_cli::chain::wallet::credential_from_entropy(&[9u8; 16], PATH, "secret").unwrap()
}

/// Stand-in for the network enclave.
///
/// Opens payloads sealed by the client and seals responses to them, keyed
/// by the nonce and client public key carried in each payload.
pub struct Enclave {
    secret: StaticSecret,
    public: [u8; 32],
}

impl Enclave {
    pub fn new() -> Self {
        let secret = StaticSecret::from([42u8; 32]);
        let public = *PublicKey::from(&secret).as_bytes();
        Self { secret, public }
    }

    /// Body of `GET /reg/consensus-io-exch-pubkey`.
    pub fn io_key_response(&self) -> String {
        json!({"height": "1", "result": {"ioExchPubkey": STANDARD.encode(self.public)}})
            .to_string()
    }

    fn key_for(&self, sealed: &[u8]) -> [u8; 32] {
        let nonce: [u8; 32] = sealed[..32].try_into().unwrap();
        let client: [u8; 32] = sealed[32..64].try_into().unwrap();
        let shared = self.secret.diffie_hellman(&PublicKey::from(client));
        derive_tx_key(shared.as_bytes(), &nonce).unwrap()
    }

    /// Code hash followed by the message, as sealed by the client.
    pub fn open(&self, sealed: &[u8]) -> Vec<u8> {
        siv_open(&self.key_for(sealed), &sealed[64..]).unwrap()
    }

    /// Contract output for the message `sealed`, base64-wrapped then sealed.
    pub fn seal_response(&self, sealed: &[u8], output: &[u8]) -> Vec<u8> {
        siv_seal(&self.key_for(sealed), STANDARD.encode(output).as_bytes()).unwrap()
    }

    /// Contract error for the message `sealed`.
    pub fn seal_error(&self, sealed: &[u8], message: &str) -> Vec<u8> {
        siv_seal(&self.key_for(sealed), message.as_bytes()).unwrap()
    }
}

/// Sealed payload carried in a smart query request target.
pub fn sealed_from_query_target(target: &str) -> Vec<u8> {
    let (_, rest) = target.split_once("/query/").unwrap();
    let segment = rest.split('?').next().unwrap();
    let encoded = String::from_utf8(hex::decode(segment).unwrap()).unwrap();
    STANDARD.decode(encoded).unwrap()
}

/// Sealed payload in field `field` of the first message of a broadcast body.
pub fn sealed_from_tx_body(body: &str, field: &str) -> Vec<u8> {
    let posted: Value = serde_json::from_str(body).unwrap();
    let encoded = posted["tx"]["msg"][0]["value"][field].as_str().unwrap();
    STANDARD.decode(encoded).unwrap()
}

/// Code hash followed by the JSON encoding of `msg`.
pub fn expected_plaintext(msg: &Value) -> Vec<u8> {
    let mut expected = CODE_HASH.as_bytes().to_vec();
    expected.extend_from_slice(msg.to_string().as_bytes());
    expected
}

/// A call observed by [`MockChain`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { bytes: usize },
    Instantiate { code_id: u64, init_msg: Value, label: String },
    Query { contract: String, msg: Value },
    Execute { contract: String, msg: Value },
}

/// In-memory chain that records every call and connection.
#[derive(Clone, Default)]
pub struct MockChain {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub connects: Arc<AtomicUsize>,
    pub fail_upload: Option<String>,
    pub fail_instantiate: Option<String>,
    pub query_response: Value,
    pub execute_data: Vec<u8>,
}

impl MockChain {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct MockClient {
    address: String,
    chain: MockChain,
}

fn failure(message: &str) -> ChainError {
    ChainError::Gateway {
        status: 500,
        body: message.to_string(),
    }
}

impl ChainClient for MockClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn upload(&self, wasm: &[u8], _opts: UploadOptions) -> ChainResult<UploadReceipt> {
        self.chain.record(Call::Upload { bytes: wasm.len() });
        if let Some(message) = &self.chain.fail_upload {
            return Err(failure(message));
        }
        Ok(UploadReceipt {
            code_id: CodeId(7),
            transaction_hash: "UPLOAD".to_string(),
        })
    }

    async fn instantiate(
        &self,
        code_id: CodeId,
        init_msg: &Value,
        label: &str,
    ) -> ChainResult<InstantiateReceipt> {
        self.chain.record(Call::Instantiate {
            code_id: code_id.0,
            init_msg: init_msg.clone(),
            label: label.to_string(),
        });
        if let Some(message) = &self.chain.fail_instantiate {
            return Err(failure(message));
        }
        Ok(InstantiateReceipt {
            contract_address: "secret1contract".to_string(),
            transaction_hash: "INIT".to_string(),
        })
    }

    async fn query_contract_smart(
        &self,
        contract_address: &str,
        query: &Value,
    ) -> ChainResult<Value> {
        self.chain.record(Call::Query {
            contract: contract_address.to_string(),
            msg: query.clone(),
        });
        Ok(self.chain.query_response.clone())
    }

    async fn execute(&self, contract_address: &str, msg: &Value) -> ChainResult<ExecuteReceipt> {
        self.chain.record(Call::Execute {
            contract: contract_address.to_string(),
            msg: msg.clone(),
        });
        Ok(ExecuteReceipt {
            data: self.chain.execute_data.clone(),
            transaction_hash: "EXEC".to_string(),
        })
    }
}

impl ClientFactory for MockChain {
    type Client = MockClient;

    fn connect(&self, credential: &Credential) -> ChainResult<MockClient> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient {
            address: credential.address.clone(),
            chain: self.clone(),
        })
    }
}

/// A request received by the mock gateway.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Request target including the query string.
    pub target: String,
    pub body: String,
}

/// Start a programmable mock gateway on an ephemeral port.
///
/// The handler maps `(method, target, body)` to `(status, json body)`.
pub async fn start_gateway<F>(handler: F) -> (SocketAddr, Arc<Mutex<Vec<RecordedRequest>>>)
where
    F: Fn(&str, &str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        serve_one(socket, handler.as_ref(), &recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, requests)
}

async fn serve_one<F>(mut socket: TcpStream, handler: &F, recorded: &Mutex<Vec<RecordedRequest>>)
where
    F: Fn(&str, &str, &str) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let (status, response) = handler(&method, &target, &body);
    recorded.lock().unwrap().push(RecordedRequest {
        method,
        target,
        body,
    });

    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    };
    let response_str = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        response.len(),
        response
    );
    let _ = socket.write_all(response_str.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
