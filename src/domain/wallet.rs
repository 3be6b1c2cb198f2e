//! Wallet Records and Directory
//!
//! Address/secret pairs for managed wallets. A record is only constructed
//! when its base58 secret derives the stated address, so the address can be
//! used as the lookup key everywhere else.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Private key derives {derived}, expected {expected}")]
    AddressMismatch { expected: String, derived: String },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Duplicate wallet address: {0}")]
    DuplicateAddress(String),
    #[error("Failed to load wallets: {0}")]
    LoadError(String),
}

/// Decode a base58 64-byte secret key into a keypair.
pub fn keypair_from_base58(secret: &str) -> Result<Keypair, WalletError> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

    if bytes.len() != 64 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "expected 64 bytes, got {}",
            bytes.len()
        )));
    }

    Keypair::try_from(bytes.as_slice()).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))
}

/// Parse a base58 address into a public key.
pub fn parse_address(address: &str) -> Result<Pubkey, WalletError> {
    address
        .parse::<Pubkey>()
        .map_err(|e| WalletError::InvalidAddress(format!("{}: {}", address, e)))
}

/// A managed wallet: base58 address plus base58 secret key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawWalletRecord")]
pub struct WalletRecord {
    address: String,
    private_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWalletRecord {
    address: String,
    private_key: String,
}

impl TryFrom<RawWalletRecord> for WalletRecord {
    type Error = WalletError;

    fn try_from(raw: RawWalletRecord) -> Result<Self, Self::Error> {
        WalletRecord::new(raw.address, raw.private_key)
    }
}

impl WalletRecord {
    /// Build a record, checking that the secret derives the address
    pub fn new(address: impl Into<String>, private_key: impl Into<String>) -> Result<Self, WalletError> {
        let address = address.into();
        let private_key = private_key.into();

        let keypair = keypair_from_base58(&private_key)?;
        let derived = keypair.pubkey().to_string();
        if derived != address {
            return Err(WalletError::AddressMismatch {
                expected: address,
                derived,
            });
        }

        Ok(Self { address, private_key })
    }

    /// Build a record from a secret key alone, deriving the address
    pub fn from_private_key(private_key: impl Into<String>) -> Result<Self, WalletError> {
        let private_key = private_key.into();
        let keypair = keypair_from_base58(&private_key)?;
        Ok(Self {
            address: keypair.pubkey().to_string(),
            private_key,
        })
    }

    /// Create a record for a freshly generated keypair
    pub fn generate() -> Self {
        Self::from_keypair(&Keypair::new())
    }

    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            address: keypair.pubkey().to_string(),
            private_key: keypair.to_base58_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn pubkey(&self) -> Result<Pubkey, WalletError> {
        parse_address(&self.address)
    }

    /// Reconstruct the signing keypair
    pub fn keypair(&self) -> Result<Keypair, WalletError> {
        keypair_from_base58(&self.private_key)
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Read-only registry of managed wallets keyed by address
#[derive(Debug, Clone, Default)]
pub struct WalletDirectory {
    wallets: HashMap<String, WalletRecord>,
    order: Vec<String>,
}

impl WalletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory, rejecting duplicate addresses
    pub fn from_records(records: impl IntoIterator<Item = WalletRecord>) -> Result<Self, WalletError> {
        let mut directory = Self::new();
        for record in records {
            directory.insert(record)?;
        }
        Ok(directory)
    }

    /// Load a JSON array of `{ "address", "privateKey" }` records
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        let records: Vec<WalletRecord> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid wallet file: {}", e)))?;

        Self::from_records(records)
    }

    /// Write the directory back out in load order
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WalletError> {
        let records: Vec<&WalletRecord> = self.iter().collect();
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| WalletError::LoadError(format!("Failed to serialize: {}", e)))?;

        fs::write(path.as_ref(), json)
            .map_err(|e| WalletError::LoadError(format!("Failed to write file: {}", e)))
    }

    fn insert(&mut self, record: WalletRecord) -> Result<(), WalletError> {
        if self.wallets.contains_key(record.address()) {
            return Err(WalletError::DuplicateAddress(record.address().to_string()));
        }
        self.order.push(record.address().to_string());
        self.wallets.insert(record.address().to_string(), record);
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&WalletRecord> {
        self.wallets.get(address)
    }

    /// True when the directory holds exactly this record (same address and secret)
    pub fn contains(&self, record: &WalletRecord) -> bool {
        self.wallets.get(record.address()) == Some(record)
    }

    /// Wallets in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = &WalletRecord> {
        self.order.iter().filter_map(|addr| self.wallets.get(addr))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
