//! Transaction Template Port
//!
//! The backend builds unsigned (or partly signed) transaction sets for each
//! operation. Blobs come back base58-encoded, in leg order, together with
//! any ephemeral wallets the client must also sign with.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{TokenMetadata, WalletRecord};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    /// Transport failure or unreadable response
    #[error("Template fetch failed: {0}")]
    FetchError(String),
    /// Backend refused to build the transactions (e.g. insufficient liquidity)
    #[error("Template rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanerTemplateRequest {
    pub seller_address: String,
    pub buyer_address: String,
    pub token_address: String,
    /// Tokens to sell; zero when the seller already sold in this batch
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_amount: Decimal,
    /// SOL the buyer spends
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub transaction_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTemplateRequest {
    pub sender_address: String,
    pub recipient_address: String,
    /// None for native SOL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub transaction_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentBuyer {
    pub address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sol_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTemplateRequest {
    pub mint_address: String,
    pub creator_address: String,
    /// Creator first, then every other contributing wallet
    pub buyers: Vec<DeploymentBuyer>,
    pub metadata: TokenMetadata,
    #[serde(with = "rust_decimal::serde::float")]
    pub transaction_fee: Decimal,
}

/// Ordered transaction legs plus backend-generated signing wallets
#[derive(Debug, Clone, Default)]
pub struct TransactionTemplate {
    /// Base58 serialized transactions
    pub transactions: Vec<String>,
    pub ephemeral_wallets: Vec<WalletRecord>,
}

#[async_trait]
pub trait TemplatePort: Send + Sync {
    async fn build_cleaner(
        &self,
        request: &CleanerTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError>;

    async fn build_transfer(
        &self,
        request: &TransferTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError>;

    async fn build_deployment(
        &self,
        request: &DeploymentTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError>;

    /// Fresh mint keypair for a token deployment
    async fn generate_mint(&self) -> Result<WalletRecord, TemplateError>;
}
