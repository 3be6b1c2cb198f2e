//! batchpilot - Multi-wallet batch operations for Solana
//!
//! Runs ordered batches of cleaner cycles, transfers and token deployments
//! through a transaction-building backend and a bundle relay.

use anyhow::Result;

use batchpilot::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in batchpilot.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
