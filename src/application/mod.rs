//! Application Layer - Batch execution
//!
//! - `orchestrator`: Sequential batch runner with pre-flight validation
//! - `submitter`: Rate-limited bundle submission
//! - `error`: Batch-level and per-operation errors

pub mod error;
pub mod orchestrator;
pub mod submitter;

pub use error::{OperationError, OrchestratorError};
pub use orchestrator::{
    BatchConfig, BatchOrchestrator, DEFAULT_INTER_OPERATION_DELAY, DEFAULT_TRANSACTION_FEE,
};
pub use submitter::BundleSubmitter;
