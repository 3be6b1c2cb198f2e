//! Bundle Relay Port
//!
//! One request/response submission of signed transactions to the relay,
//! reached through the backend proxy. No retries at this seam.

use async_trait::async_trait;
use thiserror::Error;

/// Largest bundle the relay accepts
pub const MAX_BUNDLE_SIZE: usize = 5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    /// Transport failure, timeout or unreadable response
    #[error("Relay transport error: {0}")]
    Transport(String),

    /// Relay answered with a JSON-RPC error
    #[error("Relay error: {message} (code: {code})")]
    Rejected { code: i64, message: String },

    /// Bundle refused locally before sending
    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    /// Backend proxy refused the bundle without a JSON-RPC error
    #[error("Relay refused bundle: {0}")]
    Refused(String),

    #[error("Relay response carried no bundle id")]
    MissingBundleId,
}

impl RelayError {
    /// Failures that came back from the relay itself
    pub fn is_relay_reported(&self) -> bool {
        matches!(
            self,
            RelayError::Rejected { .. } | RelayError::Refused(_) | RelayError::MissingBundleId
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayPort: Send + Sync {
    /// Send base58-encoded signed transactions as one bundle; returns the bundle id
    async fn send_bundle(&self, transactions: Vec<String>) -> Result<String, RelayError>;
}
