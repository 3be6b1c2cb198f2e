//! Backend Error Types

use thiserror::Error;

use crate::ports::{RelayError, TemplateError};

/// Errors from backend HTTP calls
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success status without a readable error body
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered but refused the request
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// Relay answered with a JSON-RPC error
    #[error("Relay error: {message} (code: {code})")]
    RelayRejected { code: i64, message: String },

    /// Relay answered without an id or an error
    #[error("Relay response carried no bundle id")]
    MissingBundleId,

    /// Bundle refused before sending
    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    /// Request timeout
    #[error("Request timed out")]
    Timeout,

    /// Network/connection error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::NetworkError(err.to_string())
        } else {
            BackendError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerializationError(err.to_string())
    }
}

impl From<BackendError> for TemplateError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(msg) => TemplateError::Rejected(msg),
            // 4xx is the backend refusing the request; 429 is throttling
            BackendError::Status { status, body }
                if (400..500).contains(&status) && status != 429 =>
            {
                TemplateError::Rejected(format!("status {}: {}", status, body))
            }
            other => TemplateError::FetchError(other.to_string()),
        }
    }
}

impl From<BackendError> for RelayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::RelayRejected { code, message } => RelayError::Rejected { code, message },
            BackendError::MissingBundleId => RelayError::MissingBundleId,
            BackendError::InvalidBundle(msg) => RelayError::InvalidBundle(msg),
            BackendError::Rejected(msg) => RelayError::Refused(msg),
            other => RelayError::Transport(other.to_string()),
        }
    }
}
