//! Bundle Submitter
//!
//! Forwards signed bundles to the relay, at most `limit` submissions in any
//! rolling window. The caller owns the `RateLimitState` and passes it in,
//! so each batch gets its own budget.

use crate::domain::RateLimitState;
use crate::ports::{RelayError, RelayPort, MAX_BUNDLE_SIZE};

pub struct BundleSubmitter<R> {
    relay: R,
}

impl<R: RelayPort> BundleSubmitter<R> {
    pub fn new(relay: R) -> Self {
        Self { relay }
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Submit one bundle, waiting for a rate-limit slot first. Bundles that
    /// could never be accepted are refused without touching the limit.
    pub async fn submit(
        &self,
        state: &mut RateLimitState,
        transactions: Vec<String>,
    ) -> Result<String, RelayError> {
        if transactions.is_empty() {
            return Err(RelayError::InvalidBundle("Bundle cannot be empty".into()));
        }
        if transactions.len() > MAX_BUNDLE_SIZE {
            return Err(RelayError::InvalidBundle(format!(
                "Bundle has {} transactions, limit is {}",
                transactions.len(),
                MAX_BUNDLE_SIZE
            )));
        }

        state.acquire().await;

        let count = transactions.len();
        match self.relay.send_bundle(transactions).await {
            Ok(bundle_id) => {
                tracing::info!("Bundle {} accepted ({} transactions)", bundle_id, count);
                Ok(bundle_id)
            }
            Err(e) => {
                tracing::warn!("Bundle submission failed: {}", e);
                Err(e)
            }
        }
    }
}
