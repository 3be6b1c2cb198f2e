//! Backend Configuration
//!
//! Connection settings for the transaction-building backend and its
//! relay proxy.

use std::time::Duration;

/// Backend API paths
pub mod paths {
    /// Cleaner cycle: sell, dump hops, buy
    pub const CLEANER: &str = "/api/tokens/cleaner";
    /// SOL or token transfer
    pub const TRANSFER: &str = "/api/tokens/transfer";
    /// Token creation plus contributor buys
    pub const CREATE: &str = "/api/tokens/create";
    /// Bundle submission through the relay proxy
    pub const SEND: &str = "/api/transactions/send";
    /// Fresh mint keypair
    pub const GENERATE_MINT: &str = "/api/utilities/generate-mint";
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
