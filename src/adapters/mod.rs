//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Backend: Template building and relay proxy over HTTP
//! - Solana: RPC balances and multi-key transaction signing
//! - CLI: Command-line interface handlers

pub mod backend;
pub mod solana;
pub mod cli;

pub use backend::BackendClient;
pub use solana::SolanaClient;
pub use cli::CliApp;
