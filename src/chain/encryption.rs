//! Contract payload encryption.
//!
//! Every contract message is sealed for the network enclave before it is
//! placed in a transaction or a query path, and every contract response is
//! opened with the nonce of the message that produced it. All client-side
//! key material derives from a per-client [`EncryptionSeed`].
//!
//! # Wire layout
//! ```text
//! nonce (32) | client x25519 public key (32) | AES-SIV(code_hash | msg)
//! ```
//!
//! The symmetric key for a message is
//! `HKDF-SHA256(x25519(client_secret, consensus_io_key) | nonce)`.

use aes_siv::siv::Aes128Siv;
use aes_siv::KeyInit;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::chain::types::{ChainError, ChainResult};

/// Length of the per-message nonce.
pub const NONCE_BYTES: usize = 32;

/// Length of an x25519 public key.
pub const PUBKEY_BYTES: usize = 32;

const HKDF_SALT: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x4b, 0xea, 0xd8, 0xdf, 0x69, 0x99,
    0x08, 0x52, 0xc2, 0x02, 0xdb, 0x0e, 0x00, 0x97, 0xc1, 0xa1, 0x2e, 0xa6, 0x37, 0xd7, 0xe9, 0x6d,
];

/// Per-message nonce.
pub type Nonce = [u8; NONCE_BYTES];

/// Random 32-byte seed scoped to one client instance.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionSeed([u8; 32]);

impl EncryptionSeed {
    /// Draw a fresh seed from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionSeed(..)")
    }
}

/// A sealed contract message and the nonce needed to open its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    pub nonce: Nonce,
    /// Full wire payload: nonce, client public key, ciphertext.
    pub bytes: Vec<u8>,
}

/// Seals contract messages for the enclave and opens its responses.
pub struct TxCipher {
    secret: StaticSecret,
    public: PublicKey,
}

impl TxCipher {
    /// Derive the client x25519 key pair from a seed.
    pub fn from_seed(seed: &EncryptionSeed) -> Self {
        let secret = StaticSecret::from(*seed.as_bytes());
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> &[u8; PUBKEY_BYTES] {
        self.public.as_bytes()
    }

    /// Seal `msg` for a contract with the given code hash, using a fresh nonce.
    pub fn seal(
        &self,
        io_key: &[u8; PUBKEY_BYTES],
        code_hash: &str,
        msg: &[u8],
    ) -> ChainResult<SealedMessage> {
        let mut nonce = [0u8; NONCE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        self.seal_with_nonce(io_key, nonce, code_hash, msg)
    }

    pub fn seal_with_nonce(
        &self,
        io_key: &[u8; PUBKEY_BYTES],
        nonce: Nonce,
        code_hash: &str,
        msg: &[u8],
    ) -> ChainResult<SealedMessage> {
        let key = self.tx_key(io_key, &nonce)?;

        let mut plaintext = Vec::with_capacity(code_hash.len() + msg.len());
        plaintext.extend_from_slice(code_hash.as_bytes());
        plaintext.extend_from_slice(msg);
        let ciphertext = siv_seal(&key, &plaintext)?;

        let mut bytes = Vec::with_capacity(NONCE_BYTES + PUBKEY_BYTES + ciphertext.len());
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(self.public.as_bytes());
        bytes.extend_from_slice(&ciphertext);
        Ok(SealedMessage { nonce, bytes })
    }

    /// Open an enclave response to the message sealed with `nonce`.
    ///
    /// An empty ciphertext opens to an empty plaintext.
    pub fn open(
        &self,
        io_key: &[u8; PUBKEY_BYTES],
        nonce: &Nonce,
        ciphertext: &[u8],
    ) -> ChainResult<Vec<u8>> {
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        let key = self.tx_key(io_key, nonce)?;
        siv_open(&key, ciphertext)
    }

    fn tx_key(&self, io_key: &[u8; PUBKEY_BYTES], nonce: &Nonce) -> ChainResult<[u8; 32]> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*io_key));
        derive_tx_key(shared.as_bytes(), nonce)
    }
}

impl std::fmt::Debug for TxCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxCipher")
            .field("public_key", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// Symmetric key for one message, from the x25519 shared secret and nonce.
pub fn derive_tx_key(shared_secret: &[u8; 32], nonce: &Nonce) -> ChainResult<[u8; 32]> {
    let mut ikm = Vec::with_capacity(shared_secret.len() + nonce.len());
    ikm.extend_from_slice(shared_secret);
    ikm.extend_from_slice(nonce);

    let mut key = [0u8; 32];
    Hkdf::<Sha256>::new(Some(&HKDF_SALT), &ikm)
        .expand(&[], &mut key)
        .map_err(|e| ChainError::Encoding(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

/// AES-SIV seal with a single empty associated-data header.
pub fn siv_seal(key: &[u8; 32], plaintext: &[u8]) -> ChainResult<Vec<u8>> {
    let mut siv = Aes128Siv::new_from_slice(key)
        .map_err(|_| ChainError::Encoding("Invalid payload key length".to_string()))?;
    siv.encrypt([&[] as &[u8]], plaintext)
        .map_err(|_| ChainError::Encoding("Payload encryption failed".to_string()))
}

/// Inverse of [`siv_seal`]; fails on any tampering or key mismatch.
pub fn siv_open(key: &[u8; 32], ciphertext: &[u8]) -> ChainResult<Vec<u8>> {
    let mut siv = Aes128Siv::new_from_slice(key)
        .map_err(|_| ChainError::Encoding("Invalid payload key length".to_string()))?;
    siv.decrypt([&[] as &[u8]], ciphertext)
        .map_err(|_| ChainError::Encoding("Payload decryption failed".to_string()))
}
