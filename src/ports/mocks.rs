//! Recording mocks for the batch ports
//!
//! Deterministic in-memory stand-ins for the backend, relay and balance
//! source. Templates are real unsigned Solana transactions so the signing
//! path is exercised end to end.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::{
    message::Message,
    pubkey::Pubkey,
    system_instruction,
    transaction::{Transaction, VersionedTransaction},
};
use tokio::time::Instant;

use super::balances::{BalanceError, BalancePort};
use super::relay::{RelayError, RelayPort};
use super::template::{
    CleanerTemplateRequest, DeploymentTemplateRequest, TemplateError, TemplatePort,
    TransactionTemplate, TransferTemplateRequest,
};
use crate::domain::{BalanceBook, WalletRecord};

/// Base58 unsigned transaction whose required signers are exactly `signers`
pub fn unsigned_transaction(signers: &[Pubkey]) -> String {
    let sink = Pubkey::new_unique();
    let instructions: Vec<_> = signers
        .iter()
        .map(|from| system_instruction::transfer(from, &sink, 1_000))
        .collect();
    let message = Message::new(&instructions, signers.first());
    let tx = VersionedTransaction::from(Transaction::new_unsigned(message));
    let bytes = bincode::serialize(&tx).unwrap_or_default();
    bs58::encode(bytes).into_string()
}

fn pubkey_of(address: &str) -> Pubkey {
    address.parse().unwrap_or_default()
}

/// Every request the mock backend received, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateCall {
    Cleaner(CleanerTemplateRequest),
    Transfer(TransferTemplateRequest),
    Deployment(DeploymentTemplateRequest),
    GenerateMint,
}

/// Mock backend that builds real templates and can reject chosen calls
#[derive(Debug, Clone, Default)]
pub struct MockTemplates {
    calls: Arc<Mutex<Vec<TemplateCall>>>,
    reject_calls: Arc<Mutex<HashSet<usize>>>,
}

impl MockTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the n-th build call (0-based, counting every call)
    pub fn rejecting_call(self, n: usize) -> Self {
        self.reject_calls.lock().unwrap().insert(n);
        self
    }

    pub fn calls(&self) -> Vec<TemplateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cleaner_requests(&self) -> Vec<CleanerTemplateRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TemplateCall::Cleaner(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: TemplateCall) -> Result<(), TemplateError> {
        let mut calls = self.calls.lock().unwrap();
        let n = calls.len();
        calls.push(call);
        if self.reject_calls.lock().unwrap().contains(&n) {
            return Err(TemplateError::Rejected(format!("call {} rejected", n)));
        }
        Ok(())
    }
}

#[async_trait]
impl TemplatePort for MockTemplates {
    async fn build_cleaner(
        &self,
        request: &CleanerTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        self.record(TemplateCall::Cleaner(request.clone()))?;

        let seller = pubkey_of(&request.seller_address);
        let buyer = pubkey_of(&request.buyer_address);
        let dump = WalletRecord::generate();
        let dump_key = pubkey_of(dump.address());

        Ok(TransactionTemplate {
            transactions: vec![
                unsigned_transaction(&[seller, dump_key]),
                unsigned_transaction(&[dump_key]),
                unsigned_transaction(&[buyer]),
            ],
            ephemeral_wallets: vec![dump],
        })
    }

    async fn build_transfer(
        &self,
        request: &TransferTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        self.record(TemplateCall::Transfer(request.clone()))?;

        Ok(TransactionTemplate {
            transactions: vec![unsigned_transaction(&[pubkey_of(&request.sender_address)])],
            ephemeral_wallets: Vec::new(),
        })
    }

    async fn build_deployment(
        &self,
        request: &DeploymentTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        self.record(TemplateCall::Deployment(request.clone()))?;

        let creator = pubkey_of(&request.creator_address);
        let mint = pubkey_of(&request.mint_address);
        let mut transactions = vec![unsigned_transaction(&[creator, mint])];
        for buyer in request.buyers.iter().skip(1) {
            transactions.push(unsigned_transaction(&[pubkey_of(&buyer.address)]));
        }

        Ok(TransactionTemplate {
            transactions,
            ephemeral_wallets: Vec::new(),
        })
    }

    async fn generate_mint(&self) -> Result<WalletRecord, TemplateError> {
        self.record(TemplateCall::GenerateMint)?;
        Ok(WalletRecord::generate())
    }
}

/// Mock relay that records bundles with their send times
#[derive(Debug, Clone, Default)]
pub struct MockRelay {
    bundles: Arc<Mutex<Vec<(Instant, Vec<String>)>>>,
    fail_calls: Arc<Mutex<HashSet<usize>>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th submission (0-based) with a relay-reported error
    pub fn failing_call(self, n: usize) -> Self {
        self.fail_calls.lock().unwrap().insert(n);
        self
    }

    pub fn bundles(&self) -> Vec<Vec<String>> {
        self.bundles.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.bundles.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn call_count(&self) -> usize {
        self.bundles.lock().unwrap().len()
    }
}

#[async_trait]
impl RelayPort for MockRelay {
    async fn send_bundle(&self, transactions: Vec<String>) -> Result<String, RelayError> {
        let mut bundles = self.bundles.lock().unwrap();
        let n = bundles.len();
        bundles.push((Instant::now(), transactions));

        if self.fail_calls.lock().unwrap().contains(&n) {
            return Err(RelayError::Rejected {
                code: -32000,
                message: format!("bundle {} dropped", n),
            });
        }
        Ok(format!("bundle-{}", n))
    }
}

/// Shared, mutable balance book for tests that move balances mid-batch
#[derive(Debug, Clone, Default)]
pub struct MockBalances {
    book: Arc<Mutex<BalanceBook>>,
    lookups: Arc<Mutex<usize>>,
}

impl MockBalances {
    pub fn new(book: BalanceBook) -> Self {
        Self {
            book: Arc::new(Mutex::new(book)),
            lookups: Arc::new(Mutex::new(0)),
        }
    }

    pub fn set_sol(&self, address: &str, amount: Decimal) {
        self.book.lock().unwrap().set_sol(address, amount);
    }

    pub fn set_token(&self, owner: &str, mint: &str, amount: Decimal) {
        self.book.lock().unwrap().set_token(owner, mint, amount);
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl BalancePort for MockBalances {
    async fn sol_balance(&self, address: &str) -> Result<Decimal, BalanceError> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.book.lock().unwrap().sol(address))
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> Result<Decimal, BalanceError> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.book.lock().unwrap().token(owner, mint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unsigned_transaction_signers() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let blob = bs58::decode(unsigned_transaction(&[a, b])).into_vec().unwrap();
        let tx: VersionedTransaction = bincode::deserialize(&blob).unwrap();

        assert_eq!(tx.message.header().num_required_signatures, 2);
        assert_eq!(tx.signatures.len(), 2);
        assert_eq!(&tx.message.static_account_keys()[..2], &[a, b]);
    }

    #[tokio::test]
    async fn test_templates_reject_selected_call() {
        let templates = MockTemplates::new().rejecting_call(1);
        let request = TransferTemplateRequest {
            sender_address: WalletRecord::generate().address().to_string(),
            recipient_address: WalletRecord::generate().address().to_string(),
            token_address: None,
            amount: dec!(1),
            transaction_fee: dec!(0),
        };

        assert!(templates.build_transfer(&request).await.is_ok());
        assert!(matches!(
            templates.build_transfer(&request).await,
            Err(TemplateError::Rejected(_))
        ));
        assert_eq!(templates.call_count(), 2);
    }

    #[tokio::test]
    async fn test_relay_fails_selected_call() {
        let relay = MockRelay::new().failing_call(0);
        assert!(relay.send_bundle(vec!["tx".into()]).await.is_err());
        assert_eq!(relay.send_bundle(vec!["tx".into()]).await.unwrap(), "bundle-1");
        assert_eq!(relay.bundles().len(), 2);
    }
}
