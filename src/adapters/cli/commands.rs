//! CLI Command Handlers
//!
//! Implementation of all CLI commands for batchpilot.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use super::plan::Plan;
use crate::adapters::backend::{BackendClient, BackendConfig};
use crate::adapters::solana::SolanaClient;
use crate::application::{BatchConfig, BatchOrchestrator, OrchestratorError};
use crate::config::{load_client_config, load_config, Config};
use crate::domain::{BatchReport, OperationStatus, WalletDirectory, WalletRecord};
use crate::ports::BalancePort;

/// batchpilot - Multi-wallet batch operations for Solana
#[derive(Parser, Debug)]
#[command(
    name = "batchpilot",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Batch orchestrator for multi-wallet Solana operations",
    long_about = "batchpilot runs ordered batches of cleaner cycles, transfers and token \
                  deployments across managed wallets, signing backend-built transactions \
                  locally and submitting them as rate-limited bundles."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a batch plan
    Run(RunCmd),

    /// Show SOL balances of every wallet in the directory
    Wallets(WalletsCmd),

    /// Create fresh wallets and write them to a directory file
    GenerateWallets(GenerateWalletsCmd),

    /// Fetch a new mint keypair from the backend
    GenerateMint(GenerateMintCmd),
}

/// Execute a batch plan
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/batchpilot.toml")]
    pub config: PathBuf,

    /// Wallet directory file (JSON list of address/privateKey records)
    #[arg(short, long, value_name = "FILE")]
    pub wallets: PathBuf,

    /// Batch plan file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub plan: PathBuf,

    /// Confirm the batch; without it nothing is sent
    #[arg(short, long)]
    pub yes: bool,

    /// Client pass-through config (JSON: rpcEndpoint, transactionFee, apiKey)
    #[arg(long, value_name = "FILE")]
    pub client_config: Option<PathBuf>,
}

/// Show wallet balances
#[derive(Parser, Debug)]
pub struct WalletsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/batchpilot.toml")]
    pub config: PathBuf,

    /// Wallet directory file
    #[arg(short, long, value_name = "FILE")]
    pub wallets: PathBuf,
}

/// Generate wallets
#[derive(Parser, Debug)]
pub struct GenerateWalletsCmd {
    /// Number of wallets to create
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Generate a mint keypair
#[derive(Parser, Debug)]
pub struct GenerateMintCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/batchpilot.toml")]
    pub config: PathBuf,
}

impl Command {
    /// Configuration file the command reads, if any
    fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Run(cmd) => Some(&cmd.config),
            Command::Wallets(cmd) => Some(&cmd.config),
            Command::GenerateMint(cmd) => Some(&cmd.config),
            Command::GenerateWallets(_) => None,
        }
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    // Config load errors surface again from the command itself
    let configured = app
        .command
        .config_path()
        .and_then(|path| load_config(expand(path)).ok())
        .map(|config| config.logging.level);
    init_logging(&log_level(app.verbose, app.debug, configured.as_deref()))?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Wallets(cmd) => wallets_command(cmd).await,
        Command::GenerateWallets(cmd) => generate_wallets_command(cmd),
        Command::GenerateMint(cmd) => generate_mint_command(cmd).await,
    }
}

/// Flags win over the configured level; RUST_LOG wins over both
fn log_level(verbose: bool, debug: bool, configured: Option<&str>) -> String {
    if debug {
        "debug".to_string()
    } else if verbose {
        "info".to_string()
    } else {
        configured.unwrap_or("warn").to_string()
    }
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Expand ~ and environment variables in a user-supplied path
fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

fn load_settings(config: &Path, client_config: Option<&Path>) -> Result<Config> {
    let config_path = expand(config);
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?
        .with_env_overrides();

    if let Some(path) = client_config {
        let path = expand(path);
        let client = load_client_config(&path)
            .with_context(|| format!("Failed to load client config from {}", path.display()))?;
        config = config.with_client(&client).context("Invalid client config")?;
    }

    Ok(config)
}

fn load_directory(path: &Path) -> Result<WalletDirectory> {
    let path = expand(path);
    WalletDirectory::from_file(&path)
        .with_context(|| format!("Failed to load wallets from {}", path.display()))
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    let config = load_settings(&cmd.config, cmd.client_config.as_deref())?;
    let directory = load_directory(&cmd.wallets)?;

    let plan_path = expand(&cmd.plan);
    let operations = Plan::from_file(&plan_path)
        .with_context(|| format!("Failed to load plan from {}", plan_path.display()))?
        .resolve(&directory)?;

    tracing::info!(
        "Loaded {} wallets and {} operations",
        directory.len(),
        operations.len()
    );

    let backend = BackendClient::new(BackendConfig::from(&config))
        .context("Failed to create backend client")?;
    let solana = SolanaClient::new(config.solana.rpc_url.clone());

    let orchestrator = BatchOrchestrator::new(backend.clone(), backend, solana, directory)
        .with_config(BatchConfig::from(&config));

    let report = match orchestrator.execute_batch(&operations, cmd.yes).await {
        Ok(report) => report,
        Err(OrchestratorError::NotConfirmed) => {
            println!(
                "{} operations planned, nothing sent. Re-run with --yes to execute.",
                operations.len()
            );
            return Ok(());
        }
        Err(OrchestratorError::ValidationFailed(issues)) => {
            for issue in &issues {
                eprintln!("  {}", issue);
            }
            bail!("Batch rejected: {} pre-flight issue(s)", issues.len());
        }
    };

    print_report(&report);
    if report.failed > 0 {
        bail!("{}", report.summary());
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    for result in &report.results {
        match result.status {
            OperationStatus::Completed => println!(
                "#{} {} {}: bundle {}",
                result.index,
                result.kind,
                result.label,
                result.bundle_id.as_deref().unwrap_or("-")
            ),
            _ => println!(
                "#{} {} {}: FAILED {}",
                result.index,
                result.kind,
                result.label,
                result.error.as_deref().unwrap_or("")
            ),
        }
    }
    println!("{}", report.summary());
}

async fn wallets_command(cmd: WalletsCmd) -> Result<()> {
    let config = load_settings(&cmd.config, None)?;
    let directory = load_directory(&cmd.wallets)?;
    let solana = SolanaClient::new(config.solana.rpc_url.clone());

    for wallet in directory.iter() {
        match solana.sol_balance(wallet.address()).await {
            Ok(sol) => println!("{}  {} SOL", wallet.address(), sol),
            Err(e) => println!("{}  unavailable ({})", wallet.address(), e),
        }
    }

    Ok(())
}

fn generate_wallets_command(cmd: GenerateWalletsCmd) -> Result<()> {
    if cmd.count == 0 {
        bail!("--count must be at least 1");
    }

    let out = expand(&cmd.out);
    if out.exists() && !cmd.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            out.display()
        );
    }

    let records: Vec<WalletRecord> = (0..cmd.count).map(|_| WalletRecord::generate()).collect();
    let directory = WalletDirectory::from_records(records)?;
    directory
        .save_to_file(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    for wallet in directory.iter() {
        println!("{}", wallet.address());
    }
    println!("Wrote {} wallets to {}", directory.len(), out.display());
    Ok(())
}

async fn generate_mint_command(cmd: GenerateMintCmd) -> Result<()> {
    let config = load_settings(&cmd.config, None)?;
    let backend = BackendClient::new(BackendConfig::from(&config))
        .context("Failed to create backend client")?;

    let mint = backend.generate_mint().await.context("Failed to generate mint")?;
    println!("{}", mint.address());
    Ok(())
}
