//! batchpilot - Batch orchestrator for multi-wallet Solana operations
//!
//! Sequences cleaner cycles, transfers and token deployments across managed
//! wallets, signs backend-built transactions locally and submits them as
//! rate-limited relay bundles.
//!
//! # Modules
//!
//! - `domain`: Wallets, amounts, operations, pre-flight rules, rate limit
//! - `ports`: Trait abstractions (TemplatePort, RelayPort, BalancePort) and mocks
//! - `adapters`: External implementations (backend HTTP, Solana RPC and signing, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Batch orchestrator and bundle submitter

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
