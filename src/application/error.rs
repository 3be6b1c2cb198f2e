use thiserror::Error;

use crate::adapters::solana::SignerError;
use crate::domain::{ValidationIssue, WalletError};
use crate::ports::{BalanceError, RelayError, TemplateError};

/// Batch-level failures. Only these stop a batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Batch not confirmed")]
    NotConfirmed,

    #[error("Batch failed validation: {}", format_issues(.0))]
    ValidationFailed(Vec<ValidationIssue>),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Per-operation failures, recorded on the operation's result
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperationError {
    #[error("Template fetch failed: {0}")]
    TemplateFetch(String),

    #[error("Template rejected: {0}")]
    TemplateRejected(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Balance unavailable: {0}")]
    BalanceUnavailable(#[from] BalanceError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Resolved {0} amount is zero")]
    ZeroAmount(&'static str),
}

impl From<TemplateError> for OperationError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::FetchError(msg) => OperationError::TemplateFetch(msg),
            TemplateError::Rejected(msg) => OperationError::TemplateRejected(msg),
        }
    }
}

impl From<SignerError> for OperationError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::MalformedTransaction(msg) => OperationError::MalformedTransaction(msg),
            SignerError::SigningError(msg) => OperationError::Signing(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_lists_every_issue() {
        let err = OrchestratorError::ValidationFailed(vec![
            ValidationIssue {
                index: 0,
                reason: "seller below reserve".into(),
            },
            ValidationIssue {
                index: 2,
                reason: "invalid mint".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("#0: seller below reserve"));
        assert!(text.contains("#2: invalid mint"));
    }

    #[test]
    fn test_conversions_keep_category() {
        let err: OperationError = TemplateError::Rejected("no liquidity".into()).into();
        assert_eq!(err, OperationError::TemplateRejected("no liquidity".into()));

        let err: OperationError = SignerError::MalformedTransaction("eof".into()).into();
        assert!(matches!(err, OperationError::MalformedTransaction(_)));

        let err: OperationError = RelayError::MissingBundleId.into();
        assert_eq!(err.to_string(), "Relay response carried no bundle id");
    }
}
