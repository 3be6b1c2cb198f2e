//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_client_config, load_config, BatchSection, ClientConfig, Config, ConfigError,
    RateLimitSection,
};
