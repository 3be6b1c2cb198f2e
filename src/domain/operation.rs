//! Operations and Results
//!
//! An `OperationDescriptor` is one unit of batch work. Each is consumed
//! exactly once and produces one `OperationResult`, whose status only moves
//! forward: Pending -> Processing -> Completed | Failed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::AmountSpec;
use super::wallet::WalletRecord;

/// Seller sells, buyer buys back, routed through backend dump wallets
#[derive(Debug, Clone, PartialEq)]
pub struct CleanerOperation {
    pub seller: WalletRecord,
    pub buyer: WalletRecord,
    pub token_address: String,
    /// Resolved against the seller's token balance
    pub sell_amount: AmountSpec,
    /// Resolved against the buyer's SOL balance
    pub buy_amount: AmountSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Sol,
    Token(String),
}

impl AssetKind {
    pub fn mint(&self) -> Option<&str> {
        match self {
            AssetKind::Sol => None,
            AssetKind::Token(mint) => Some(mint),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOperation {
    pub source: WalletRecord,
    pub recipient: String,
    pub amount: AmountSpec,
    pub asset: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// One wallet's SOL buy-in for a deployment
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub wallet: WalletRecord,
    pub sol_amount: Decimal,
}

/// Token launch; the first contribution is the creator wallet
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentOperation {
    pub contributions: Vec<Contribution>,
    pub metadata: TokenMetadata,
}

impl DeploymentOperation {
    pub fn creator(&self) -> Option<&WalletRecord> {
        self.contributions.first().map(|c| &c.wallet)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationDescriptor {
    Cleaner(CleanerOperation),
    Transfer(TransferOperation),
    Deployment(DeploymentOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Cleaner,
    Transfer,
    Deployment,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Cleaner => write!(f, "cleaner"),
            OperationKind::Transfer => write!(f, "transfer"),
            OperationKind::Deployment => write!(f, "deployment"),
        }
    }
}

impl OperationDescriptor {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationDescriptor::Cleaner(_) => OperationKind::Cleaner,
            OperationDescriptor::Transfer(_) => OperationKind::Transfer,
            OperationDescriptor::Deployment(_) => OperationKind::Deployment,
        }
    }

    /// Every wallet this operation signs with
    pub fn wallets(&self) -> Vec<&WalletRecord> {
        match self {
            OperationDescriptor::Cleaner(op) => vec![&op.seller, &op.buyer],
            OperationDescriptor::Transfer(op) => vec![&op.source],
            OperationDescriptor::Deployment(op) => {
                op.contributions.iter().map(|c| &c.wallet).collect()
            }
        }
    }

    /// Short human-readable description used in logs and results
    pub fn label(&self) -> String {
        match self {
            OperationDescriptor::Cleaner(op) => format!(
                "{} -> {} ({})",
                short(op.seller.address()),
                short(op.buyer.address()),
                short(&op.token_address)
            ),
            OperationDescriptor::Transfer(op) => {
                let asset = match &op.asset {
                    AssetKind::Sol => "SOL".to_string(),
                    AssetKind::Token(mint) => short(mint),
                };
                format!(
                    "{} {} {} -> {}",
                    op.amount,
                    asset,
                    short(op.source.address()),
                    short(&op.recipient)
                )
            }
            OperationDescriptor::Deployment(op) => format!(
                "deploy {} with {} wallet(s)",
                op.metadata.symbol,
                op.contributions.len()
            ),
        }
    }
}

fn short(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        address.to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}..{}", head, tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

/// Attempted transition out of a terminal state or out of order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status transition: {from:?} -> {to:?}")]
pub struct StatusTransitionError {
    pub from: OperationStatus,
    pub to: OperationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    /// Position of the descriptor in the submitted batch
    pub index: usize,
    pub kind: OperationKind,
    pub label: String,
    pub status: OperationStatus,
    pub bundle_id: Option<String>,
    pub error: Option<String>,
    /// Sell amount actually sent for cleaner operations
    pub sell_amount: Option<Decimal>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OperationResult {
    pub fn pending(index: usize, descriptor: &OperationDescriptor) -> Self {
        Self {
            index,
            kind: descriptor.kind(),
            label: descriptor.label(),
            status: OperationStatus::Pending,
            bundle_id: None,
            error: None,
            sell_amount: None,
            finished_at: None,
        }
    }

    pub fn begin(&mut self) -> Result<(), StatusTransitionError> {
        self.transition(OperationStatus::Pending, OperationStatus::Processing)
    }

    pub fn complete(&mut self, bundle_id: String) -> Result<(), StatusTransitionError> {
        self.transition(OperationStatus::Processing, OperationStatus::Completed)?;
        self.bundle_id = Some(bundle_id);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), StatusTransitionError> {
        self.transition(OperationStatus::Processing, OperationStatus::Failed)?;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(
        &mut self,
        expected: OperationStatus,
        next: OperationStatus,
    ) -> Result<(), StatusTransitionError> {
        if self.status != expected {
            return Err(StatusTransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Completed
    }
}

/// Full outcome of one batch call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<OperationResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_results(results: Vec<OperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results
            .iter()
            .filter(|r| r.status == OperationStatus::Failed)
            .count();
        Self {
            results,
            succeeded,
            failed,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.succeeded == self.results.len()
    }

    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer() -> OperationDescriptor {
        OperationDescriptor::Transfer(TransferOperation {
            source: WalletRecord::generate(),
            recipient: WalletRecord::generate().address().to_string(),
            amount: AmountSpec::absolute(dec!(1)),
            asset: AssetKind::Sol,
        })
    }

    #[test]
    fn test_status_happy_path() {
        let mut result = OperationResult::pending(0, &transfer());
        assert_eq!(result.status, OperationStatus::Pending);

        result.begin().unwrap();
        assert_eq!(result.status, OperationStatus::Processing);

        result.complete("bundle-1".to_string()).unwrap();
        assert!(result.is_success());
        assert_eq!(result.bundle_id.as_deref(), Some("bundle-1"));
        assert!(result.finished_at.is_some());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut result = OperationResult::pending(0, &transfer());
        result.begin().unwrap();
        result.fail("relay down").unwrap();

        assert!(result.status.is_terminal());
        assert!(result.begin().is_err());
        assert!(result.complete("late".to_string()).is_err());
        assert!(result.fail("again").is_err());
        assert_eq!(result.error.as_deref(), Some("relay down"));
        assert!(result.bundle_id.is_none());
    }

    #[test]
    fn test_cannot_complete_without_processing() {
        let mut result = OperationResult::pending(3, &transfer());
        let err = result.complete("x".to_string()).unwrap_err();
        assert_eq!(err.from, OperationStatus::Pending);
        assert_eq!(err.to, OperationStatus::Completed);
    }

    #[test]
    fn test_report_counts() {
        let mut ok = OperationResult::pending(0, &transfer());
        ok.begin().unwrap();
        ok.complete("b".to_string()).unwrap();

        let mut bad = OperationResult::pending(1, &transfer());
        bad.begin().unwrap();
        bad.fail("boom").unwrap();

        let report = BatchReport::from_results(vec![ok, bad]);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.summary(), "1 succeeded, 1 failed");
    }

    #[test]
    fn test_descriptor_wallets_and_kind() {
        let creator = WalletRecord::generate();
        let sniper = WalletRecord::generate();
        let deploy = OperationDescriptor::Deployment(DeploymentOperation {
            contributions: vec![
                Contribution { wallet: creator.clone(), sol_amount: dec!(1) },
                Contribution { wallet: sniper.clone(), sol_amount: dec!(0.5) },
            ],
            metadata: TokenMetadata {
                name: "Test".to_string(),
                symbol: "TST".to_string(),
                description: String::new(),
                image_uri: None,
                twitter: None,
                telegram: None,
                website: None,
            },
        });

        assert_eq!(deploy.kind(), OperationKind::Deployment);
        assert_eq!(deploy.wallets(), vec![&creator, &sniper]);
        assert!(deploy.label().contains("TST"));
    }

    #[test]
    fn test_label_handles_multibyte_addresses() {
        let transfer = OperationDescriptor::Transfer(TransferOperation {
            source: WalletRecord::generate(),
            recipient: "ééééé-ünïcødé-ààààà".to_string(),
            amount: AmountSpec::Absolute(dec!(1)),
            asset: AssetKind::Token("ⓜⓘⓝⓣⓜⓘⓝⓣⓜ".to_string()),
        });

        let label = transfer.label();
        assert!(label.contains("éééé..àààà"));
        assert!(label.contains("ⓜⓘⓝⓣ..ⓘⓝⓣⓜ"));
    }
}
