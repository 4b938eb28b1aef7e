//! Abstract IDX client.
//!
//! The transport is not part of this workspace: callers plug in an
//! implementation of [`IdxClientFactory`]. The flow controller only ever
//! talks to these traits.

use crate::model::{RemediationStep, Response, TokenBundle};
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Settings needed to start an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxClientConfig {
    pub issuer: Url,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

impl IdxClientConfig {
    /// Issuer-relative endpoint, e.g. `v1/userinfo`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.issuer.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Errors reported by an IDX client implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdxClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for client calls.
pub type IdxClientResult<T> = Result<T, IdxClientError>;

/// Creates a started interaction.
#[async_trait]
pub trait IdxClientFactory: Send + Sync {
    type Client: IdxClient;

    async fn start(&self, config: &IdxClientConfig) -> IdxClientResult<Self::Client>;
}

/// A started interaction.
#[async_trait]
pub trait IdxClient: Send + Sync {
    /// Fetch the current state of the interaction.
    async fn resume(&self) -> IdxClientResult<Response>;

    /// Submit a step with the values written into its form.
    async fn proceed(&self, step: &RemediationStep) -> IdxClientResult<Response>;

    /// Exchange the `issue` step for tokens.
    async fn exchange_for_tokens(&self, issue: &RemediationStep) -> IdxClientResult<TokenBundle>;
}
