//! Amount Specifications
//!
//! Percentage or absolute amounts, resolved against a live balance at
//! execution time.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSpec {
    /// Share of the live balance, in (0, 100]
    Percentage(Decimal),
    /// Fixed amount in whole units (SOL or tokens), > 0
    Absolute(Decimal),
}

impl AmountSpec {
    pub fn percentage(pct: Decimal) -> Self {
        AmountSpec::Percentage(pct)
    }

    pub fn absolute(amount: Decimal) -> Self {
        AmountSpec::Absolute(amount)
    }

    /// Check bounds: percentage in (0, 100], absolute > 0
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            AmountSpec::Percentage(pct) if pct <= Decimal::ZERO || pct > dec!(100) => {
                Err(format!("percentage must be in (0, 100], got {}", pct))
            }
            AmountSpec::Absolute(amount) if amount <= Decimal::ZERO => {
                Err(format!("absolute amount must be > 0, got {}", amount))
            }
            _ => Ok(()),
        }
    }

    /// Resolve against a balance. Absolute amounts ignore the balance.
    pub fn resolve(&self, balance: Decimal) -> Decimal {
        match *self {
            AmountSpec::Percentage(pct) => balance * pct / dec!(100),
            AmountSpec::Absolute(amount) => amount,
        }
    }

    pub fn is_percentage(&self) -> bool {
        matches!(self, AmountSpec::Percentage(_))
    }
}

impl fmt::Display for AmountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountSpec::Percentage(pct) => write!(f, "{}%", pct),
            AmountSpec::Absolute(amount) => write!(f, "{}", amount),
        }
    }
}

/// Convert lamports to SOL without rounding
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}
