//! Backend Wire Types
//!
//! Response bodies from the backend and the relay proxy.

use serde::{Deserialize, Serialize};

use crate::domain::{WalletError, WalletRecord};

/// Response from any template-building endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    #[serde(default)]
    pub success: bool,
    /// Base58 serialized transactions, in leg order
    #[serde(default)]
    pub transactions: Vec<String>,
    /// Intermediate wallets the backend generated for this set
    #[serde(default)]
    pub dump_wallets: Vec<DumpWallet>,
    pub error: Option<String>,
}

/// Ephemeral wallet handed out with a template
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpWallet {
    pub public_key: String,
    pub private_key: String,
}

impl TryFrom<DumpWallet> for WalletRecord {
    type Error = WalletError;

    fn try_from(wallet: DumpWallet) -> Result<Self, Self::Error> {
        WalletRecord::new(wallet.public_key, wallet.private_key)
    }
}

/// Bundle submission payload
#[derive(Debug, Clone, Serialize)]
pub struct SendBundleRequest {
    pub transactions: Vec<String>,
}

/// Relay proxy response; the relay's JSON-RPC reply sits under `result`
#[derive(Debug, Clone, Deserialize)]
pub struct SendBundleResponse {
    pub result: Option<JsonRpcResponse<String>>,
    /// Proxy-level error, when the relay was never reached
    pub error: Option<String>,
}

/// JSON-RPC response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    /// Result (if success)
    pub result: Option<T>,
    /// Error (if failure)
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    /// Additional error data
    pub data: Option<serde_json::Value>,
}

/// Mint keypair from the generate-mint utility
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    #[serde(alias = "publicKey")]
    pub pubkey: String,
    #[serde(alias = "privateKey")]
    pub secret_key: String,
}
