use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_client::{rpc_client::RpcClient, rpc_request::TokenAccountsFilter};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::lamports_to_sol;
use crate::ports::{BalanceError, BalancePort};

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid token amount: {0}")]
    InvalidAmount(String),
}

impl From<SolanaClientError> for BalanceError {
    fn from(err: SolanaClientError) -> Self {
        match err {
            SolanaClientError::InvalidPublicKey(msg) => BalanceError::InvalidAddress(msg),
            other => BalanceError::LookupFailed(other.to_string()),
        }
    }
}

fn parse_pubkey(address: &str) -> Result<Pubkey, SolanaClientError> {
    Pubkey::from_str(address).map_err(|e| SolanaClientError::InvalidPublicKey(format!("{}: {}", address, e)))
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    /// Create a new Solana RPC client
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()));
        Self { client }
    }

    /// Get SOL balance in lamports
    pub async fn get_balance(&self, address: &str) -> Result<u64, SolanaClientError> {
        let pubkey = parse_pubkey(address)?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Total UI balance of `mint` across every token account `owner` holds.
    /// Owners with no account for the mint read as zero.
    pub async fn get_token_balance(&self, owner: &str, mint: &str) -> Result<Decimal, SolanaClientError> {
        let owner = parse_pubkey(owner)?;
        let mint = parse_pubkey(mint)?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            let accounts = client
                .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint))
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))?;

            let mut total = Decimal::ZERO;
            for account in accounts {
                let pubkey = parse_pubkey(&account.pubkey)?;
                let balance = client
                    .get_token_account_balance(&pubkey)
                    .map_err(|e| SolanaClientError::RpcError(e.to_string()))?;
                let amount = Decimal::from_str(&balance.ui_amount_string)
                    .map_err(|e| SolanaClientError::InvalidAmount(format!("{}: {}", balance.ui_amount_string, e)))?;
                total += amount;
            }
            Ok(total)
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl BalancePort for SolanaClient {
    async fn sol_balance(&self, address: &str) -> Result<Decimal, BalanceError> {
        let lamports = self.get_balance(address).await?;
        Ok(lamports_to_sol(lamports))
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> Result<Decimal, BalanceError> {
        Ok(self.get_token_balance(owner, mint).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SolanaClient::new("https://api.devnet.solana.com".to_string());
        // Just verify it compiles and constructs
        assert!(std::mem::size_of_val(&client) > 0);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_before_rpc() {
        let client = SolanaClient::new("http://127.0.0.1:1".to_string());
        let err = client.sol_balance("not-a-key").await.unwrap_err();
        assert!(matches!(err, BalanceError::InvalidAddress(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SolanaClientError::RpcError("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));

        let err: BalanceError = SolanaClientError::RpcError("down".to_string()).into();
        assert!(matches!(err, BalanceError::LookupFailed(_)));
    }
}
