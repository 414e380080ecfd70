//! Mnemonic-derived signing wallet.
//!
//! # Security
//! - Mnemonics and private keys are never logged or serialized by this type
//! - The only persisted form of key material is the credential file
//!   written by the keygen workflow

use bech32::{ToBase32, Variant};
use bip32::{DerivationPath, XPrv};
use bip39::Mnemonic;
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use rand::RngCore;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::chain::types::{ChainError, ChainResult};
use crate::identity::Credential;

/// Bytes of entropy behind a freshly generated mnemonic (12 words).
pub const ENTROPY_BYTES: usize = 16;

/// Wallet holding a secp256k1 key derived from a BIP-39 mnemonic.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    /// Compressed SEC1 public key.
    public_key: Vec<u8>,
    address: String,
}

impl Wallet {
    /// Derive a wallet from a mnemonic phrase.
    ///
    /// # Arguments
    /// * `phrase` - BIP-39 English mnemonic
    /// * `derivation_path` - BIP-32 path, e.g. `m/44'/529'/0'/0/0`
    /// * `prefix` - bech32 prefix of the account address
    pub fn from_mnemonic(phrase: &str, derivation_path: &str, prefix: &str) -> ChainResult<Self> {
        let mnemonic = Mnemonic::parse_normalized(phrase.trim())
            .map_err(|e| ChainError::Wallet(format!("Invalid mnemonic: {}", e)))?;
        Self::from_parsed(&mnemonic, derivation_path, prefix)
    }

    fn from_parsed(mnemonic: &Mnemonic, derivation_path: &str, prefix: &str) -> ChainResult<Self> {
        let seed = mnemonic.to_seed_normalized("");
        let path: DerivationPath = derivation_path.parse().map_err(|e| {
            ChainError::Wallet(format!("Invalid derivation path '{}': {}", derivation_path, e))
        })?;
        let xprv = XPrv::derive_from_path(seed, &path)
            .map_err(|e| ChainError::Wallet(format!("Key derivation failed: {}", e)))?;

        let signing_key = xprv.private_key().clone();
        let public_key = signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let address = pubkey_to_address(&public_key, prefix)?;

        Ok(Self {
            signing_key,
            public_key,
            address,
        })
    }

    /// Build the wallet for a stored credential.
    ///
    /// The address is re-derived from the mnemonic and must match the stored one.
    pub fn from_credential(
        credential: &Credential,
        derivation_path: &str,
        prefix: &str,
    ) -> ChainResult<Self> {
        let wallet = Self::from_mnemonic(&credential.mnemonic, derivation_path, prefix)?;
        if wallet.address != credential.address {
            return Err(ChainError::Wallet(format!(
                "Credential address {} does not match derived address {}",
                credential.address, wallet.address
            )));
        }
        Ok(wallet)
    }

    /// Get the wallet's bech32 address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the compressed public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Sign arbitrary bytes (SHA-256 digest, 64-byte `r || s`).
    pub fn sign(&self, sign_bytes: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(sign_bytes);
        signature.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive a credential from raw entropy.
pub fn credential_from_entropy(
    entropy: &[u8],
    derivation_path: &str,
    prefix: &str,
) -> ChainResult<Credential> {
    let mnemonic = Mnemonic::from_entropy(entropy)
        .map_err(|e| ChainError::Wallet(format!("Invalid entropy: {}", e)))?;
    let wallet = Wallet::from_parsed(&mnemonic, derivation_path, prefix)?;
    Ok(Credential {
        mnemonic: mnemonic.to_string(),
        address: wallet.address,
    })
}

/// Generate a fresh credential from 128 bits of OS randomness.
pub fn generate_credential(derivation_path: &str, prefix: &str) -> ChainResult<Credential> {
    let mut entropy = [0u8; ENTROPY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    credential_from_entropy(&entropy, derivation_path, prefix)
}

/// `bech32(prefix, ripemd160(sha256(pubkey)))`
pub fn pubkey_to_address(public_key: &[u8], prefix: &str) -> ChainResult<String> {
    let sha = Sha256::digest(public_key);
    let hash = Ripemd160::digest(sha);
    bech32::encode(prefix, hash.to_base32(), Variant::Bech32)
        .map_err(|e| ChainError::Wallet(format!("Address encoding failed: {}", e)))
}
