//! Pre-flight Validation
//!
//! Checks a whole batch before any network call. Every problem is reported
//! with the index of the descriptor that caused it; a single problem rejects
//! the batch.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

use super::amount::AmountSpec;
use super::balances::BalanceBook;
use super::operation::{AssetKind, OperationDescriptor};
use super::wallet::{parse_address, WalletDirectory, WalletRecord};

/// Minimum SOL a cleaner seller must hold
pub const DEFAULT_MIN_SOL_RESERVE: Decimal = dec!(0.01);

/// Extra SOL each deploying wallet must hold on top of its contribution
pub const DEFAULT_DISTRIBUTION_PADDING: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreflightLimits {
    pub min_sol_reserve: Decimal,
    pub distribution_padding: Decimal,
}

impl Default for PreflightLimits {
    fn default() -> Self {
        Self {
            min_sol_reserve: DEFAULT_MIN_SOL_RESERVE,
            distribution_padding: DEFAULT_DISTRIBUTION_PADDING,
        }
    }
}

/// One failed check, tied to the descriptor that failed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.reason)
    }
}

/// Validate every descriptor. `balances` must hold the SOL balances of
/// every wallet named in the batch.
pub fn validate_batch(
    descriptors: &[OperationDescriptor],
    directory: &WalletDirectory,
    balances: &BalanceBook,
    limits: &PreflightLimits,
) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if descriptors.is_empty() {
        issues.push(ValidationIssue {
            index: 0,
            reason: "batch is empty".to_string(),
        });
        return Err(issues);
    }

    for (index, descriptor) in descriptors.iter().enumerate() {
        let mut fail = |reason: String| issues.push(ValidationIssue { index, reason });

        for wallet in descriptor.wallets() {
            check_wallet(wallet, directory, &mut fail);
        }

        match descriptor {
            OperationDescriptor::Cleaner(op) => {
                check_amount("sell", &op.sell_amount, &mut fail);
                check_amount("buy", &op.buy_amount, &mut fail);
                check_mint(&op.token_address, &mut fail);

                if op.seller.address() == op.buyer.address() {
                    fail(format!("seller and buyer are the same wallet {}", op.seller.address()));
                }

                let sol = balances.sol(op.seller.address());
                if sol < limits.min_sol_reserve {
                    fail(format!(
                        "seller {} has {} SOL, below the {} SOL reserve",
                        op.seller.address(),
                        sol,
                        limits.min_sol_reserve
                    ));
                }
            }
            OperationDescriptor::Transfer(op) => {
                check_amount("transfer", &op.amount, &mut fail);

                if parse_address(&op.recipient).is_err() {
                    fail(format!("invalid recipient address {}", op.recipient));
                } else if op.recipient == op.source.address() {
                    fail("recipient is the source wallet".to_string());
                }

                if let AssetKind::Token(mint) = &op.asset {
                    check_mint(mint, &mut fail);
                }
            }
            OperationDescriptor::Deployment(op) => {
                if op.contributions.is_empty() {
                    fail("deployment names no wallets".to_string());
                }
                if op.metadata.name.trim().is_empty() {
                    fail("token name is empty".to_string());
                }
                if op.metadata.symbol.trim().is_empty() {
                    fail("token symbol is empty".to_string());
                }

                for contribution in &op.contributions {
                    let address = contribution.wallet.address();
                    if contribution.sol_amount <= Decimal::ZERO {
                        fail(format!(
                            "contribution for {} must be > 0, got {}",
                            address, contribution.sol_amount
                        ));
                        continue;
                    }

                    let needed = contribution.sol_amount + limits.distribution_padding;
                    let sol = balances.sol(address);
                    if sol < needed {
                        fail(format!(
                            "wallet {} has {} SOL, needs {} (contribution + padding)",
                            address, sol, needed
                        ));
                    }
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_wallet(wallet: &WalletRecord, directory: &WalletDirectory, fail: &mut impl FnMut(String)) {
    match directory.get(wallet.address()) {
        None => fail(format!("wallet {} is not in the directory", wallet.address())),
        Some(known) if known != wallet => fail(format!(
            "wallet {} does not match the directory record",
            wallet.address()
        )),
        Some(_) => {}
    }
}

fn check_amount(what: &str, spec: &AmountSpec, fail: &mut impl FnMut(String)) {
    if let Err(reason) = spec.validate() {
        fail(format!("{} amount: {}", what, reason));
    }
}

fn check_mint(mint: &str, fail: &mut impl FnMut(String)) {
    if parse_address(mint).is_err() {
        fail(format!("invalid token address {}", mint));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::{
        CleanerOperation, Contribution, DeploymentOperation, TokenMetadata, TransferOperation,
    };

    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn cleaner(seller: &WalletRecord, buyer: &WalletRecord) -> OperationDescriptor {
        OperationDescriptor::Cleaner(CleanerOperation {
            seller: seller.clone(),
            buyer: buyer.clone(),
            token_address: MINT.to_string(),
            sell_amount: AmountSpec::percentage(dec!(100)),
            buy_amount: AmountSpec::percentage(dec!(50)),
        })
    }

    fn setup() -> (WalletRecord, WalletRecord, WalletDirectory, BalanceBook) {
        let seller = WalletRecord::generate();
        let buyer = WalletRecord::generate();
        let directory = WalletDirectory::from_records(vec![seller.clone(), buyer.clone()]).unwrap();
        let balances = BalanceBook::new()
            .with_sol(seller.address(), dec!(1))
            .with_sol(buyer.address(), dec!(1));
        (seller, buyer, directory, balances)
    }

    #[test]
    fn test_valid_cleaner_batch() {
        let (seller, buyer, directory, balances) = setup();
        let batch = vec![cleaner(&seller, &buyer)];
        assert!(validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).is_ok());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let (_, _, directory, balances) = setup();
        let issues = validate_batch(&[], &directory, &balances, &PreflightLimits::default()).unwrap_err();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_seller_below_reserve() {
        let (seller, buyer, directory, balances) = setup();
        let balances = balances.with_sol(seller.address(), dec!(0.005));
        let batch = vec![cleaner(&seller, &buyer)];

        let issues = validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 0);
        assert!(issues[0].reason.contains("reserve"));
    }

    #[test]
    fn test_reserve_boundary_is_inclusive() {
        let (seller, buyer, directory, balances) = setup();
        let balances = balances.with_sol(seller.address(), dec!(0.01));
        let batch = vec![cleaner(&seller, &buyer)];
        assert!(validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).is_ok());
    }

    #[test]
    fn test_unknown_wallet_itemized() {
        let (seller, buyer, directory, balances) = setup();
        let stranger = WalletRecord::generate();
        let batch = vec![
            cleaner(&seller, &buyer),
            OperationDescriptor::Transfer(TransferOperation {
                source: stranger,
                recipient: buyer.address().to_string(),
                amount: AmountSpec::absolute(dec!(0.1)),
                asset: AssetKind::Sol,
            }),
        ];

        let issues = validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].index, 1);
        assert!(issues[0].reason.contains("not in the directory"));
    }

    #[test]
    fn test_bad_amounts_and_addresses() {
        let (seller, buyer, directory, balances) = setup();
        let batch = vec![
            OperationDescriptor::Cleaner(CleanerOperation {
                seller: seller.clone(),
                buyer: buyer.clone(),
                token_address: "not-a-mint".to_string(),
                sell_amount: AmountSpec::percentage(dec!(150)),
                buy_amount: AmountSpec::absolute(dec!(0)),
            }),
            OperationDescriptor::Transfer(TransferOperation {
                source: seller.clone(),
                recipient: "garbage".to_string(),
                amount: AmountSpec::percentage(dec!(10)),
                asset: AssetKind::Sol,
            }),
        ];

        let issues = validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).unwrap_err();
        let first: Vec<_> = issues.iter().filter(|i| i.index == 0).collect();
        let second: Vec<_> = issues.iter().filter(|i| i.index == 1).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_deployment_needs_padding() {
        let (creator, sniper, directory, balances) = setup();
        let metadata = TokenMetadata {
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            description: String::new(),
            image_uri: None,
            twitter: None,
            telegram: None,
            website: None,
        };
        let batch = vec![OperationDescriptor::Deployment(DeploymentOperation {
            contributions: vec![
                Contribution { wallet: creator.clone(), sol_amount: dec!(0.95) },
                Contribution { wallet: sniper.clone(), sol_amount: dec!(0.96) },
            ],
            metadata,
        })];

        let issues = validate_batch(&batch, &directory, &balances, &PreflightLimits::default()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].reason.contains(sniper.address()));
    }
}
