//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching batchpilot.toml
//! structure, then layers environment variables and the client pass-through
//! config on top.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::backend::BackendConfig;
use crate::application::orchestrator::{
    BatchConfig, DEFAULT_INTER_OPERATION_DELAY, DEFAULT_TRANSACTION_FEE,
};
use crate::domain::preflight::{DEFAULT_DISTRIBUTION_PADDING, DEFAULT_MIN_SOL_RESERVE};
use crate::domain::rate_limit::{DEFAULT_MAX_SUBMISSIONS, DEFAULT_WINDOW};

/// Environment variable overriding `backend.api_key`
pub const ENV_API_KEY: &str = "BACKEND_API_KEY";

/// Environment variable overriding `solana.rpc_url`
pub const ENV_RPC_URL: &str = "SOLANA_RPC_URL";

/// Main configuration structure matching batchpilot.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendSection,
    pub solana: SolanaSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Backend API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    /// Base URL of the transaction-building backend
    pub base_url: String,
    /// Sent as the x-api-key header
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint used for balance lookups
    pub rpc_url: String,
}

/// Batch execution section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Pause before every operation after the first
    pub inter_operation_delay_ms: u64,
    /// Minimum SOL a cleaner seller must hold
    pub min_sol_reserve: Decimal,
    /// SOL each deploying wallet must hold on top of its contribution
    pub distribution_padding_sol: Decimal,
    /// Fee in SOL attached to every template request
    pub transaction_fee: Decimal,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            inter_operation_delay_ms: DEFAULT_INTER_OPERATION_DELAY.as_millis() as u64,
            min_sol_reserve: DEFAULT_MIN_SOL_RESERVE,
            distribution_padding_sol: DEFAULT_DISTRIBUTION_PADDING,
            transaction_fee: DEFAULT_TRANSACTION_FEE,
        }
    }
}

/// Relay rate limit section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub max_submissions: usize,
    pub window_ms: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
            window_ms: DEFAULT_WINDOW.as_millis() as u64,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Pass-through settings from the client, JSON with camelCase keys.
/// Unrecognized keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub rpc_endpoint: Option<String>,
    pub transaction_fee: Option<Decimal>,
    pub api_key: Option<String>,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to parse client config: {0}")]
    ClientConfigError(#[from] serde_json::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the client pass-through config from a JSON file
pub fn load_client_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error, got {}",
                self.logging.level
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.batch.min_sol_reserve < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "min_sol_reserve must be >= 0, got {}",
                self.batch.min_sol_reserve
            )));
        }

        if self.batch.distribution_padding_sol < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "distribution_padding_sol must be >= 0, got {}",
                self.batch.distribution_padding_sol
            )));
        }

        if self.batch.transaction_fee < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "transaction_fee must be >= 0, got {}",
                self.batch.transaction_fee
            )));
        }

        if self.rate_limit.max_submissions == 0 {
            return Err(ConfigError::ValidationError(
                "max_submissions must be > 0".to_string(),
            ));
        }

        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::ValidationError(
                "window_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply BACKEND_API_KEY and SOLANA_RPC_URL from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.backend.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_RPC_URL).filter(|u| !u.is_empty()) {
            self.solana.rpc_url = url;
        }
        self
    }

    /// Overlay the client pass-through settings
    pub fn with_client(mut self, client: &ClientConfig) -> Result<Self, ConfigError> {
        if let Some(ref url) = client.rpc_endpoint {
            self.solana.rpc_url = url.clone();
        }
        if let Some(fee) = client.transaction_fee {
            self.batch.transaction_fee = fee;
        }
        if let Some(ref key) = client.api_key {
            self.backend.api_key = Some(key.clone());
        }
        self.validate()?;
        Ok(self)
    }
}

impl From<&Config> for BatchConfig {
    fn from(config: &Config) -> Self {
        BatchConfig {
            inter_operation_delay: Duration::from_millis(config.batch.inter_operation_delay_ms),
            transaction_fee: config.batch.transaction_fee,
            min_sol_reserve: config.batch.min_sol_reserve,
            distribution_padding: config.batch.distribution_padding_sol,
            max_submissions: config.rate_limit.max_submissions,
            rate_window: Duration::from_millis(config.rate_limit.window_ms),
        }
    }
}

impl From<&Config> for BackendConfig {
    fn from(config: &Config) -> Self {
        let backend = BackendConfig::new(config.backend.base_url.clone())
            .with_timeout(Duration::from_secs(config.backend.timeout_secs));
        match config.backend.api_key {
            Some(ref key) if !key.is_empty() => backend.with_api_key(key.clone()),
            _ => backend,
        }
    }
}
