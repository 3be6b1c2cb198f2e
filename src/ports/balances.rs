//! Balance Port
//!
//! Live SOL and token balances, read at execution time.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::BalanceBook;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BalanceError {
    #[error("Balance lookup failed: {0}")]
    LookupFailed(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[async_trait]
pub trait BalancePort: Send + Sync {
    /// SOL balance in whole SOL
    async fn sol_balance(&self, address: &str) -> Result<Decimal, BalanceError>;

    /// Token balance in UI units (decimals applied)
    async fn token_balance(&self, owner: &str, mint: &str) -> Result<Decimal, BalanceError>;
}

/// A fixed snapshot never fails; unknown wallets read as zero
#[async_trait]
impl BalancePort for BalanceBook {
    async fn sol_balance(&self, address: &str) -> Result<Decimal, BalanceError> {
        Ok(self.sol(address))
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> Result<Decimal, BalanceError> {
        Ok(self.token(owner, mint))
    }
}
