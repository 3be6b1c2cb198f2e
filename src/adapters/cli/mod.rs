//! CLI Adapter
//!
//! Command-line interface for batchpilot.
//! Uses clap derive macros for argument parsing.

mod commands;
mod plan;

pub use commands::{CliApp, Command, GenerateMintCmd, GenerateWalletsCmd, RunCmd, WalletsCmd};
pub use plan::{Plan, PlanError, PlannedContribution, PlannedOperation};

use anyhow::Result;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
