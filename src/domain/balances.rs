//! Balance Book
//!
//! Snapshot of SOL and token balances per wallet. The mapping is total:
//! any address (or address/mint pair) without an entry has a balance of
//! zero. Callers never need their own fallback literal.

use std::collections::HashMap;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Default)]
pub struct BalanceBook {
    sol: HashMap<String, Decimal>,
    tokens: HashMap<(String, String), Decimal>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sol(mut self, address: impl Into<String>, amount: Decimal) -> Self {
        self.set_sol(address, amount);
        self
    }

    pub fn with_token(
        mut self,
        owner: impl Into<String>,
        mint: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.set_token(owner, mint, amount);
        self
    }

    pub fn set_sol(&mut self, address: impl Into<String>, amount: Decimal) {
        self.sol.insert(address.into(), amount);
    }

    pub fn set_token(&mut self, owner: impl Into<String>, mint: impl Into<String>, amount: Decimal) {
        self.tokens.insert((owner.into(), mint.into()), amount);
    }

    /// SOL balance, zero when unknown
    pub fn sol(&self, address: &str) -> Decimal {
        self.sol.get(address).copied().unwrap_or(Decimal::ZERO)
    }

    /// Token balance in UI units, zero when unknown
    pub fn token(&self, owner: &str, mint: &str) -> Decimal {
        self.tokens
            .get(&(owner.to_string(), mint.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_sol(&self) -> Decimal {
        self.sol.values().copied().sum()
    }
}
