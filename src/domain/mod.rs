//! Domain Layer - Core batch types for batchpilot
//!
//! Pure types and rules with no network dependencies:
//! - `wallet`: Wallet records and the read-only wallet directory
//! - `amount`: Percentage/absolute amount specs resolved against live balances
//! - `balances`: Total (default-zero) balance book
//! - `operation`: Operation descriptors, per-item results and batch reports
//! - `preflight`: Batch-wide validation run before any network call
//! - `rate_limit`: Rolling-window relay submission limit

pub mod wallet;
pub mod amount;
pub mod balances;
pub mod operation;
pub mod preflight;
pub mod rate_limit;

pub use wallet::{WalletRecord, WalletDirectory, WalletError, keypair_from_base58, parse_address};
pub use amount::{AmountSpec, lamports_to_sol, LAMPORTS_PER_SOL};
pub use balances::BalanceBook;
pub use operation::{
    AssetKind, BatchReport, CleanerOperation, Contribution, DeploymentOperation,
    OperationDescriptor, OperationKind, OperationResult, OperationStatus, StatusTransitionError,
    TokenMetadata, TransferOperation,
};
pub use preflight::{validate_batch, PreflightLimits, ValidationIssue};
pub use rate_limit::RateLimitState;
