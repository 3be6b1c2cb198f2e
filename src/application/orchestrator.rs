//! Batch Orchestrator
//!
//! Runs an ordered batch of cleaner cycles, transfers and deployments one
//! at a time. Each operation fetches its transaction template, signs it
//! with the wallets involved plus any backend-generated keys, and submits
//! the result as one rate-limited bundle.
//!
//! A single failing operation never stops the batch. Only a missing
//! confirmation or a failed pre-flight check does, and both happen before
//! the first network call.

use std::collections::HashSet;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_sdk::signature::Keypair;

use super::error::{OperationError, OrchestratorError};
use super::submitter::BundleSubmitter;
use crate::adapters::solana::sign_with_pool;
use crate::domain::preflight::{DEFAULT_DISTRIBUTION_PADDING, DEFAULT_MIN_SOL_RESERVE};
use crate::domain::rate_limit::{DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW};
use crate::domain::{
    validate_batch, AmountSpec, AssetKind, BalanceBook, BatchReport, CleanerOperation,
    DeploymentOperation, OperationDescriptor, OperationResult, PreflightLimits, RateLimitState,
    TransferOperation, ValidationIssue, WalletDirectory, WalletRecord,
};
use crate::ports::{
    BalancePort, CleanerTemplateRequest, DeploymentBuyer, DeploymentTemplateRequest, RelayPort,
    TemplatePort, TransactionTemplate, TransferTemplateRequest,
};

/// Default pause between operations
pub const DEFAULT_INTER_OPERATION_DELAY: Duration = Duration::from_secs(1);

/// Default fee (SOL) attached to every template request
pub const DEFAULT_TRANSACTION_FEE: Decimal = dec!(0.001);

/// Tunables for one orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub inter_operation_delay: Duration,
    pub transaction_fee: Decimal,
    pub min_sol_reserve: Decimal,
    pub distribution_padding: Decimal,
    pub max_submissions: usize,
    pub rate_window: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inter_operation_delay: DEFAULT_INTER_OPERATION_DELAY,
            transaction_fee: DEFAULT_TRANSACTION_FEE,
            min_sol_reserve: DEFAULT_MIN_SOL_RESERVE,
            distribution_padding: DEFAULT_DISTRIBUTION_PADDING,
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
            rate_window: DEFAULT_WINDOW,
        }
    }
}

impl BatchConfig {
    pub fn limits(&self) -> PreflightLimits {
        PreflightLimits {
            min_sol_reserve: self.min_sol_reserve,
            distribution_padding: self.distribution_padding,
        }
    }

    pub fn rate_limit_state(&self) -> RateLimitState {
        RateLimitState::new(self.max_submissions, self.rate_window)
    }
}

/// State that lives for exactly one `execute_batch` call
struct BatchRun {
    rate_limit: RateLimitState,
    /// Sellers whose sell leg already went through in this batch
    sold: HashSet<String>,
}

pub struct BatchOrchestrator<T, R, B> {
    templates: T,
    submitter: BundleSubmitter<R>,
    balances: B,
    directory: WalletDirectory,
    config: BatchConfig,
}

impl<T, R, B> BatchOrchestrator<T, R, B>
where
    T: TemplatePort,
    R: RelayPort,
    B: BalancePort,
{
    pub fn new(templates: T, relay: R, balances: B, directory: WalletDirectory) -> Self {
        Self {
            templates,
            submitter: BundleSubmitter::new(relay),
            balances,
            directory,
            config: BatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn directory(&self) -> &WalletDirectory {
        &self.directory
    }

    /// Run a confirmed batch. Returns one result per descriptor, in input
    /// order, or a batch-level error if nothing was attempted.
    pub async fn execute_batch(
        &self,
        descriptors: &[OperationDescriptor],
        confirmed: bool,
    ) -> Result<BatchReport, OrchestratorError> {
        if !confirmed {
            tracing::warn!("Batch of {} operations not confirmed, nothing sent", descriptors.len());
            return Err(OrchestratorError::NotConfirmed);
        }

        self.preflight(descriptors).await?;

        tracing::info!(
            "Executing batch of {} operations ({:?} between operations)",
            descriptors.len(),
            self.config.inter_operation_delay
        );

        let mut run = BatchRun {
            rate_limit: self.config.rate_limit_state(),
            sold: HashSet::new(),
        };
        let total = descriptors.len();
        let mut results = Vec::with_capacity(total);

        for (index, descriptor) in descriptors.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.inter_operation_delay).await;
            }

            let mut result = OperationResult::pending(index, descriptor);
            if let Err(e) = result.begin() {
                tracing::error!("[{}/{}] {}", index + 1, total, e);
            }
            tracing::info!("[{}/{}] {} {}", index + 1, total, result.kind, result.label);

            let outcome = self.run_operation(descriptor, &mut run, &mut result).await;
            let recorded = match outcome {
                Ok(bundle_id) => {
                    tracing::info!("[{}/{}] completed, bundle {}", index + 1, total, bundle_id);
                    result.complete(bundle_id)
                }
                Err(e) => {
                    tracing::warn!("[{}/{}] failed: {}", index + 1, total, e);
                    result.fail(e.to_string())
                }
            };
            if let Err(e) = recorded {
                tracing::error!("[{}/{}] {}", index + 1, total, e);
            }

            results.push(result);
        }

        let report = BatchReport::from_results(results);
        tracing::info!("Batch finished: {}", report.summary());
        Ok(report)
    }

    /// Gather the SOL balances pre-flight needs, then validate the batch
    async fn preflight(&self, descriptors: &[OperationDescriptor]) -> Result<(), OrchestratorError> {
        let mut book = BalanceBook::new();
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let addresses: Vec<&str> = match descriptor {
                OperationDescriptor::Cleaner(op) => vec![op.seller.address()],
                OperationDescriptor::Deployment(op) => {
                    op.contributions.iter().map(|c| c.wallet.address()).collect()
                }
                OperationDescriptor::Transfer(_) => Vec::new(),
            };

            for address in addresses {
                if !seen.insert(address.to_string()) {
                    continue;
                }
                match self.balances.sol_balance(address).await {
                    Ok(sol) => book.set_sol(address, sol),
                    Err(e) => issues.push(ValidationIssue {
                        index,
                        reason: format!("balance of {} unavailable: {}", address, e),
                    }),
                }
            }
        }

        if let Err(found) = validate_batch(descriptors, &self.directory, &book, &self.config.limits()) {
            issues.extend(found);
        }

        if issues.is_empty() {
            return Ok(());
        }

        issues.sort_by_key(|i| i.index);
        for issue in &issues {
            tracing::error!("Pre-flight {}", issue);
        }
        Err(OrchestratorError::ValidationFailed(issues))
    }

    async fn run_operation(
        &self,
        descriptor: &OperationDescriptor,
        run: &mut BatchRun,
        result: &mut OperationResult,
    ) -> Result<String, OperationError> {
        match descriptor {
            OperationDescriptor::Cleaner(op) => self.run_cleaner(op, run, result).await,
            OperationDescriptor::Transfer(op) => self.run_transfer(op, run).await,
            OperationDescriptor::Deployment(op) => self.run_deployment(op, run).await,
        }
    }

    async fn run_cleaner(
        &self,
        op: &CleanerOperation,
        run: &mut BatchRun,
        result: &mut OperationResult,
    ) -> Result<String, OperationError> {
        let seller = op.seller.address();
        let carries_sell = !run.sold.contains(seller);

        let sell_amount = if carries_sell {
            self.resolve_token(&op.sell_amount, seller, &op.token_address).await?
        } else {
            tracing::debug!("Seller {} already sold in this batch, buy leg only", seller);
            Decimal::ZERO
        };
        result.sell_amount = Some(sell_amount);

        let buy_amount = self.resolve_sol(&op.buy_amount, op.buyer.address()).await?;
        if buy_amount <= Decimal::ZERO {
            return Err(OperationError::ZeroAmount("buy"));
        }

        let request = CleanerTemplateRequest {
            seller_address: seller.to_string(),
            buyer_address: op.buyer.address().to_string(),
            token_address: op.token_address.clone(),
            sell_amount,
            buy_amount,
            transaction_fee: self.config.transaction_fee,
        };
        tracing::debug!("Cleaner request: sell {} buy {} SOL", sell_amount, buy_amount);

        let template = self.templates.build_cleaner(&request).await?;
        let bundle_id = self
            .sign_and_submit(template, &[&op.seller, &op.buyer], run)
            .await?;

        if carries_sell {
            run.sold.insert(seller.to_string());
        }
        Ok(bundle_id)
    }

    async fn run_transfer(
        &self,
        op: &TransferOperation,
        run: &mut BatchRun,
    ) -> Result<String, OperationError> {
        let source = op.source.address();
        let amount = match &op.asset {
            AssetKind::Sol => self.resolve_sol(&op.amount, source).await?,
            AssetKind::Token(mint) => self.resolve_token(&op.amount, source, mint).await?,
        };
        if amount <= Decimal::ZERO {
            return Err(OperationError::ZeroAmount("transfer"));
        }

        let request = TransferTemplateRequest {
            sender_address: source.to_string(),
            recipient_address: op.recipient.clone(),
            token_address: op.asset.mint().map(str::to_string),
            amount,
            transaction_fee: self.config.transaction_fee,
        };

        let template = self.templates.build_transfer(&request).await?;
        self.sign_and_submit(template, &[&op.source], run).await
    }

    async fn run_deployment(
        &self,
        op: &DeploymentOperation,
        run: &mut BatchRun,
    ) -> Result<String, OperationError> {
        let creator = op
            .creator()
            .ok_or_else(|| OperationError::TemplateRejected("deployment names no wallets".into()))?;

        let mint = self.templates.generate_mint().await?;
        tracing::info!("Deploying {} at mint {}", op.metadata.symbol, mint.address());

        let request = DeploymentTemplateRequest {
            mint_address: mint.address().to_string(),
            creator_address: creator.address().to_string(),
            buyers: op
                .contributions
                .iter()
                .map(|c| DeploymentBuyer {
                    address: c.wallet.address().to_string(),
                    sol_amount: c.sol_amount,
                })
                .collect(),
            metadata: op.metadata.clone(),
            transaction_fee: self.config.transaction_fee,
        };

        let template = self.templates.build_deployment(&request).await?;

        let mut signers: Vec<&WalletRecord> = op.contributions.iter().map(|c| &c.wallet).collect();
        signers.push(&mint);
        self.sign_and_submit(template, &signers, run).await
    }

    /// Sign every blob with whichever of the wallets and ephemeral keys it
    /// needs, then send the set as one bundle
    async fn sign_and_submit(
        &self,
        template: TransactionTemplate,
        wallets: &[&WalletRecord],
        run: &mut BatchRun,
    ) -> Result<String, OperationError> {
        let mut pool: Vec<Keypair> = Vec::with_capacity(wallets.len() + template.ephemeral_wallets.len());
        for wallet in wallets.iter().copied().chain(template.ephemeral_wallets.iter()) {
            pool.push(wallet.keypair()?);
        }

        let mut signed = Vec::with_capacity(template.transactions.len());
        for (leg, blob) in template.transactions.iter().enumerate() {
            let (tx, missing) = sign_with_pool(blob, &pool)?;
            if !missing.is_empty() {
                let missing: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
                tracing::warn!(
                    "Transaction {} still needs signatures from {}",
                    leg,
                    missing.join(", ")
                );
            }
            signed.push(tx);
        }

        Ok(self.submitter.submit(&mut run.rate_limit, signed).await?)
    }

    /// SOL amount; percentages read the live balance
    async fn resolve_sol(&self, spec: &AmountSpec, address: &str) -> Result<Decimal, OperationError> {
        if !spec.is_percentage() {
            return Ok(spec.resolve(Decimal::ZERO));
        }
        let balance = self.balances.sol_balance(address).await?;
        Ok(spec.resolve(balance))
    }

    /// Token amount; percentages read the live balance
    async fn resolve_token(
        &self,
        spec: &AmountSpec,
        owner: &str,
        mint: &str,
    ) -> Result<Decimal, OperationError> {
        if !spec.is_percentage() {
            return Ok(spec.resolve(Decimal::ZERO));
        }
        let balance = self.balances.token_balance(owner, mint).await?;
        Ok(spec.resolve(balance))
    }
}
