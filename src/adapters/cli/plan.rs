//! Batch Plan Files
//!
//! A plan is the JSON list of operations a user wants to run, naming
//! wallets by address. Addresses are resolved against the wallet directory
//! to build operation descriptors.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::{
    AmountSpec, AssetKind, CleanerOperation, Contribution, DeploymentOperation,
    OperationDescriptor, TokenMetadata, TransferOperation, WalletDirectory, WalletRecord,
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse plan: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Operation #{index}: wallet {address} is not in the wallet directory")]
    UnknownWallet { index: usize, address: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub operations: Vec<PlannedOperation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannedOperation {
    #[serde(rename_all = "camelCase")]
    Cleaner {
        seller: String,
        buyer: String,
        token_address: String,
        sell_amount: AmountSpec,
        buy_amount: AmountSpec,
    },
    #[serde(rename_all = "camelCase")]
    Transfer {
        source: String,
        recipient: String,
        amount: AmountSpec,
        #[serde(default = "sol_asset")]
        asset: AssetKind,
    },
    #[serde(rename_all = "camelCase")]
    Deployment {
        contributions: Vec<PlannedContribution>,
        metadata: TokenMetadata,
    },
}

fn sol_asset() -> AssetKind {
    AssetKind::Sol
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedContribution {
    pub wallet: String,
    pub sol_amount: Decimal,
}

impl Plan {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every wallet named in the plan must exist in `directory`
    pub fn resolve(&self, directory: &WalletDirectory) -> Result<Vec<OperationDescriptor>, PlanError> {
        self.operations
            .iter()
            .enumerate()
            .map(|(index, op)| op.resolve(index, directory))
            .collect()
    }
}

impl PlannedOperation {
    fn resolve(&self, index: usize, directory: &WalletDirectory) -> Result<OperationDescriptor, PlanError> {
        let lookup = |address: &str| -> Result<WalletRecord, PlanError> {
            directory
                .get(address)
                .cloned()
                .ok_or_else(|| PlanError::UnknownWallet {
                    index,
                    address: address.to_string(),
                })
        };

        Ok(match self {
            PlannedOperation::Cleaner {
                seller,
                buyer,
                token_address,
                sell_amount,
                buy_amount,
            } => OperationDescriptor::Cleaner(CleanerOperation {
                seller: lookup(seller)?,
                buyer: lookup(buyer)?,
                token_address: token_address.clone(),
                sell_amount: *sell_amount,
                buy_amount: *buy_amount,
            }),
            PlannedOperation::Transfer {
                source,
                recipient,
                amount,
                asset,
            } => OperationDescriptor::Transfer(TransferOperation {
                source: lookup(source)?,
                recipient: recipient.clone(),
                amount: *amount,
                asset: asset.clone(),
            }),
            PlannedOperation::Deployment {
                contributions,
                metadata,
            } => OperationDescriptor::Deployment(DeploymentOperation {
                contributions: contributions
                    .iter()
                    .map(|c| {
                        Ok(Contribution {
                            wallet: lookup(&c.wallet)?,
                            sol_amount: c.sol_amount,
                        })
                    })
                    .collect::<Result<_, PlanError>>()?,
                metadata: metadata.clone(),
            }),
        })
    }
}
