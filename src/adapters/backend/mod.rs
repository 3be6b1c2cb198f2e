//! Backend Adapter
//!
//! HTTP client for the transaction-building backend and the bundle relay
//! it proxies.

mod client;
mod config;
mod error;
mod types;

pub use client::BackendClient;
pub use config::{paths, BackendConfig, DEFAULT_BASE_URL};
pub use error::BackendError;
pub use types::{
    DumpWallet, JsonRpcError, JsonRpcResponse, MintResponse, SendBundleRequest,
    SendBundleResponse, TemplateResponse,
};
