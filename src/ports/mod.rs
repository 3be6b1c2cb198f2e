//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Transaction templates (backend transaction builder)
//! - Bundle relay submission
//! - Live wallet balances

pub mod template;
pub mod relay;
pub mod balances;
pub mod mocks;

pub use template::{
    CleanerTemplateRequest, DeploymentBuyer, DeploymentTemplateRequest, TemplateError,
    TemplatePort, TransactionTemplate, TransferTemplateRequest,
};
pub use relay::{RelayError, RelayPort, MAX_BUNDLE_SIZE};
pub use balances::{BalanceError, BalancePort};
