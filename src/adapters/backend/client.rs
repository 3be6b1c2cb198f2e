//! Backend Client
//!
//! HTTP client for the transaction-building backend. Builds unsigned
//! templates for each operation kind, hands out mint keypairs, and proxies
//! signed bundles to the relay.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::{paths, BackendConfig};
use super::error::BackendError;
use super::types::{MintResponse, SendBundleRequest, SendBundleResponse, TemplateResponse};
use crate::domain::WalletRecord;
use crate::ports::{
    CleanerTemplateRequest, DeploymentTemplateRequest, RelayError, RelayPort, TemplateError,
    TemplatePort, TransactionTemplate, TransferTemplateRequest, MAX_BUNDLE_SIZE,
};

/// Backend API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref key) => req.header("x-api-key", key),
            None => req,
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let req = self.http.post(self.config.url(path)).json(body);
        let response = self.authorized(req).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: "rate limit exceeded".into(),
            });
        }

        if !status.is_success() {
            // The backend reports refusals as {"success": false, "error": "..."}
            if let Ok(TemplateResponse { error: Some(error), .. }) = serde_json::from_str(&body) {
                return Err(BackendError::Rejected(error));
            }
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// POST a template request and unpack the transaction set
    async fn fetch_template<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<TransactionTemplate, BackendError> {
        let response: TemplateResponse = self.post_json(path, body).await?;

        if !response.success || response.error.is_some() {
            return Err(BackendError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }
        if response.transactions.is_empty() {
            return Err(BackendError::Rejected("no transactions returned".into()));
        }

        let ephemeral_wallets = response
            .dump_wallets
            .into_iter()
            .map(WalletRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BackendError::SerializationError(format!("Invalid dump wallet: {}", e)))?;

        tracing::debug!(
            "{} returned {} transactions, {} dump wallets",
            path,
            response.transactions.len(),
            ephemeral_wallets.len()
        );

        Ok(TransactionTemplate {
            transactions: response.transactions,
            ephemeral_wallets,
        })
    }

    /// Send signed transactions as one bundle through the relay proxy
    pub async fn send_bundle(&self, transactions: Vec<String>) -> Result<String, BackendError> {
        if transactions.is_empty() {
            return Err(BackendError::InvalidBundle("Bundle cannot be empty".into()));
        }
        if transactions.len() > MAX_BUNDLE_SIZE {
            return Err(BackendError::InvalidBundle(format!(
                "Bundle cannot contain more than {} transactions",
                MAX_BUNDLE_SIZE
            )));
        }

        let response: SendBundleResponse = self
            .post_json(paths::SEND, &SendBundleRequest { transactions })
            .await?;

        if let Some(error) = response.error {
            return Err(BackendError::Rejected(error));
        }

        let rpc = response.result.ok_or(BackendError::MissingBundleId)?;
        if let Some(error) = rpc.error {
            return Err(BackendError::RelayRejected {
                code: error.code,
                message: error.message,
            });
        }

        rpc.result.ok_or(BackendError::MissingBundleId)
    }

    /// Fresh mint keypair
    pub async fn generate_mint(&self) -> Result<WalletRecord, BackendError> {
        let req = self.http.get(self.config.url(paths::GENERATE_MINT));
        let response = self.authorized(req).send().await?;
        let mint: MintResponse = Self::handle_response(response).await?;

        WalletRecord::new(mint.pubkey, mint.secret_key)
            .map_err(|e| BackendError::SerializationError(format!("Invalid mint keypair: {}", e)))
    }
}

#[async_trait]
impl TemplatePort for BackendClient {
    async fn build_cleaner(
        &self,
        request: &CleanerTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        Ok(self.fetch_template(paths::CLEANER, request).await?)
    }

    async fn build_transfer(
        &self,
        request: &TransferTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        Ok(self.fetch_template(paths::TRANSFER, request).await?)
    }

    async fn build_deployment(
        &self,
        request: &DeploymentTemplateRequest,
    ) -> Result<TransactionTemplate, TemplateError> {
        Ok(self.fetch_template(paths::CREATE, request).await?)
    }

    async fn generate_mint(&self) -> Result<WalletRecord, TemplateError> {
        Ok(BackendClient::generate_mint(self).await?)
    }
}

#[async_trait]
impl RelayPort for BackendClient {
    async fn send_bundle(&self, transactions: Vec<String>) -> Result<String, RelayError> {
        Ok(BackendClient::send_bundle(self, transactions).await?)
    }
}
