//! Chain client capability interface and its REST gateway implementation.
//!
//! # Responsibilities
//! - Define the four contract operations every workflow is written against
//! - Build a signing client from a credential (the client factory)
//! - Talk to the legacy Secret REST gateway: accounts, node info, code
//!   hashes, the enclave key, broadcast, smart queries
//! - Seal every contract message for the enclave and open its responses
//!
//! No retries and no timeouts are applied here; a failed call surfaces
//! immediately to the workflow that issued it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::chain::encryption::{EncryptionSeed, Nonce, SealedMessage, TxCipher, PUBKEY_BYTES};
use crate::chain::transaction::{
    self, AccountInfo, AccountResponse, BroadcastResponse, CodeHashResponse,
    ConsensusIoKeyResponse, NodeInfoResponse, SmartQueryResponse,
};
use crate::chain::types::{
    ChainError, ChainResult, CodeId, ExecuteReceipt, FeeSchedule, InstantiateReceipt, StdFee,
    UploadOptions, UploadReceipt,
};
use crate::chain::wallet::Wallet;
use crate::config::schema::{CliConfig, NetworkConfig};
use crate::identity::Credential;

/// Contract operations exposed by a signing chain client.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Address of the signing account.
    fn address(&self) -> &str;

    /// Store contract bytecode on chain.
    async fn upload(&self, wasm: &[u8], opts: UploadOptions) -> ChainResult<UploadReceipt>;

    /// Create a contract instance from uploaded code.
    async fn instantiate(
        &self,
        code_id: CodeId,
        init_msg: &Value,
        label: &str,
    ) -> ChainResult<InstantiateReceipt>;

    /// Read-only query against a contract.
    async fn query_contract_smart(&self, contract_address: &str, query: &Value)
        -> ChainResult<Value>;

    /// State-mutating call against a contract.
    async fn execute(&self, contract_address: &str, msg: &Value) -> ChainResult<ExecuteReceipt>;
}

/// Builds a signing client for a credential.
pub trait ClientFactory {
    type Client: ChainClient;

    fn connect(&self, credential: &Credential) -> ChainResult<Self::Client>;
}

/// Factory producing [`LcdClient`]s from the CLI configuration.
#[derive(Debug, Clone)]
pub struct LcdClientFactory {
    network: NetworkConfig,
    fees: FeeSchedule,
    http: reqwest::Client,
}

impl LcdClientFactory {
    pub fn new(network: NetworkConfig, fees: FeeSchedule) -> Self {
        Self {
            network,
            fees,
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client for every client this factory builds.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn from_config(config: &CliConfig) -> Self {
        Self::new(config.network.clone(), config.fees.clone())
    }
}

impl ClientFactory for LcdClientFactory {
    type Client = LcdClient;

    fn connect(&self, credential: &Credential) -> ChainResult<Self::Client> {
        let wallet = Wallet::from_credential(
            credential,
            &self.network.derivation_path,
            &self.network.address_prefix,
        )?;
        LcdClient::new(
            self.http.clone(),
            &self.network.endpoint,
            wallet,
            EncryptionSeed::generate(),
            self.fees.clone(),
        )
    }
}

/// Signing client for a legacy Secret REST gateway.
pub struct LcdClient {
    http: reqwest::Client,
    base_url: Url,
    wallet: Wallet,
    cipher: TxCipher,
    io_key: OnceCell<[u8; PUBKEY_BYTES]>,
    fees: FeeSchedule,
}

impl LcdClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `http` - HTTP client used for every gateway call
    /// * `endpoint` - Base URL of the gateway
    /// * `wallet` - Signing identity
    /// * `seed` - Encryption seed behind every payload of this client
    /// * `fees` - Fee schedule applied per operation
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        wallet: Wallet,
        seed: EncryptionSeed,
        fees: FeeSchedule,
    ) -> ChainResult<Self> {
        let base_url = parse_base_url(endpoint)?;

        tracing::debug!(
            endpoint = %base_url,
            address = %wallet.address(),
            "Chain client initialized"
        );

        Ok(Self {
            http,
            base_url,
            wallet,
            cipher: TxCipher::from_seed(&seed),
            io_key: OnceCell::new(),
            fees,
        })
    }

    fn url(&self, path: &str) -> ChainResult<Url> {
        self.base_url.join(path).map_err(|e| ChainError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ChainResult<T> {
        tracing::debug!(url = %url, "GET");
        let res = self.http.get(url).send().await?;
        Ok(check_status(res).await?.json().await?)
    }

    async fn account(&self) -> ChainResult<AccountInfo> {
        let url = self.url(&format!("auth/accounts/{}", self.wallet.address()))?;
        let res: AccountResponse = self.get_json(url).await?;
        Ok(res.result.value)
    }

    async fn chain_id(&self) -> ChainResult<String> {
        let res: NodeInfoResponse = self.get_json(self.url("node_info")?).await?;
        Ok(res.node_info.network)
    }

    /// Enclave public key, fetched once per client.
    async fn consensus_io_key(&self) -> ChainResult<&[u8; PUBKEY_BYTES]> {
        self.io_key.get_or_try_init(|| self.fetch_io_key()).await
    }

    async fn fetch_io_key(&self) -> ChainResult<[u8; PUBKEY_BYTES]> {
        let res: ConsensusIoKeyResponse = self
            .get_json(self.url("reg/consensus-io-exch-pubkey")?)
            .await?;
        let bytes = STANDARD
            .decode(res.result.io_exch_pubkey.as_bytes())
            .map_err(|e| ChainError::Encoding(format!("Invalid io key: {}", e)))?;
        <[u8; PUBKEY_BYTES]>::try_from(bytes.as_slice())
            .map_err(|_| ChainError::Encoding(format!("Invalid io key length {}", bytes.len())))
    }

    async fn code_hash_by_code_id(&self, code_id: CodeId) -> ChainResult<String> {
        let res: CodeHashResponse = self
            .get_json(self.url(&format!("wasm/code/{}/hash", code_id))?)
            .await?;
        Ok(res.result)
    }

    async fn code_hash_by_contract(&self, contract_address: &str) -> ChainResult<String> {
        let res: CodeHashResponse = self
            .get_json(self.url(&format!("wasm/contract/{}/code-hash", contract_address))?)
            .await?;
        Ok(res.result)
    }

    async fn seal(&self, code_hash: &str, msg: &Value) -> ChainResult<SealedMessage> {
        let io_key = self.consensus_io_key().await?;
        self.cipher.seal(io_key, code_hash, &serde_json::to_vec(msg)?)
    }

    async fn open(&self, nonce: &Nonce, ciphertext: &[u8]) -> ChainResult<Vec<u8>> {
        let io_key = self.consensus_io_key().await?;
        self.cipher.open(io_key, nonce, ciphertext)
    }

    /// Open a response that the enclave returns as sealed base64 text.
    async fn open_base64(&self, nonce: &Nonce, ciphertext: &[u8]) -> ChainResult<Vec<u8>> {
        let encoded = self.open(nonce, ciphertext).await?;
        STANDARD
            .decode(encoded)
            .map_err(|e| ChainError::Encoding(format!("Invalid contract response: {}", e)))
    }

    /// Sign and broadcast a single message, waiting for block inclusion.
    ///
    /// With a nonce, an encrypted contract error in a failed tx is opened
    /// before it is returned.
    async fn sign_and_broadcast(
        &self,
        msg: Value,
        fee: &StdFee,
        nonce: Option<&Nonce>,
    ) -> ChainResult<BroadcastResponse> {
        let account = self.account().await?;
        let chain_id = self.chain_id().await?;
        let msgs = vec![msg];

        let sign_bytes = transaction::sign_bytes(&chain_id, &account, fee, &msgs, "")?;
        let signature = self.wallet.sign(&sign_bytes);
        let tx = transaction::std_tx(msgs, fee, self.wallet.public_key(), &signature, "")?;

        let url = self.url("txs")?;
        tracing::debug!(
            url = %url,
            chain_id = %chain_id,
            sequence = account.sequence,
            "Broadcasting transaction"
        );
        let res = self
            .http
            .post(url)
            .json(&json!({ "mode": "block", "tx": tx }))
            .send()
            .await?;
        let response: BroadcastResponse = check_status(res).await?.json().await?;

        let response = match (response.into_result(), nonce) {
            (Err(ChainError::Tx { code, raw_log }), Some(nonce)) => {
                let io_key = self.consensus_io_key().await?;
                let raw_log = transaction::decrypt_raw_log(&raw_log, |cipher| {
                    self.cipher.open(io_key, nonce, cipher)
                });
                return Err(ChainError::Tx { code, raw_log });
            }
            (result, _) => result?,
        };

        tracing::info!(tx_hash = %response.txhash, "Transaction included");
        Ok(response)
    }
}

impl ChainClient for LcdClient {
    fn address(&self) -> &str {
        self.wallet.address()
    }

    async fn upload(&self, wasm: &[u8], opts: UploadOptions) -> ChainResult<UploadReceipt> {
        let msg = transaction::store_code_msg(self.wallet.address(), wasm, &opts);
        let response = self.sign_and_broadcast(msg, &self.fees.upload, None).await?;
        Ok(UploadReceipt {
            code_id: response.code_id()?,
            transaction_hash: response.txhash,
        })
    }

    async fn instantiate(
        &self,
        code_id: CodeId,
        init_msg: &Value,
        label: &str,
    ) -> ChainResult<InstantiateReceipt> {
        let code_hash = self.code_hash_by_code_id(code_id).await?;
        let sealed = self.seal(&code_hash, init_msg).await?;
        let msg = transaction::instantiate_msg(self.wallet.address(), code_id, label, &sealed.bytes);
        let response = self
            .sign_and_broadcast(msg, &self.fees.init, Some(&sealed.nonce))
            .await?;
        Ok(InstantiateReceipt {
            contract_address: response.contract_address()?,
            transaction_hash: response.txhash,
        })
    }

    async fn query_contract_smart(
        &self,
        contract_address: &str,
        query: &Value,
    ) -> ChainResult<Value> {
        let code_hash = self.code_hash_by_contract(contract_address).await?;
        let sealed = self.seal(&code_hash, query).await?;
        let mut url = self.url(&format!(
            "wasm/contract/{}/query/{}",
            contract_address,
            transaction::query_path_segment(&sealed.bytes)
        ))?;
        url.set_query(Some("encoding=hex"));

        let res: SmartQueryResponse = self.get_json(url).await?;
        let ciphertext = STANDARD
            .decode(res.result.smart.as_bytes())
            .map_err(|e| ChainError::Encoding(format!("Invalid query response: {}", e)))?;
        let plain = self.open_base64(&sealed.nonce, &ciphertext).await?;
        Ok(serde_json::from_slice(&plain)?)
    }

    async fn execute(&self, contract_address: &str, msg: &Value) -> ChainResult<ExecuteReceipt> {
        let code_hash = self.code_hash_by_contract(contract_address).await?;
        let sealed = self.seal(&code_hash, msg).await?;
        let msg = transaction::execute_msg(self.wallet.address(), contract_address, &sealed.bytes);
        let response = self
            .sign_and_broadcast(msg, &self.fees.exec, Some(&sealed.nonce))
            .await?;
        let data = self.open_base64(&sealed.nonce, &response.data_bytes()?).await?;
        Ok(ExecuteReceipt {
            data,
            transaction_hash: response.txhash,
        })
    }
}

impl std::fmt::Debug for LcdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LcdClient")
            .field("base_url", &self.base_url.as_str())
            .field("address", &self.wallet.address())
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

/// Parse the endpoint, forcing a trailing slash so relative joins append.
fn parse_base_url(endpoint: &str) -> ChainResult<Url> {
    let mut url: Url = endpoint.parse().map_err(|e: url::ParseError| ChainError::InvalidUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn check_status(res: Response) -> ChainResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Gateway returned error status");
    Err(ChainError::Gateway {
        status: status.as_u16(),
        body,
    })
}
