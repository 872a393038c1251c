//! Per-call client construction.
//!
//! The dispatcher asks a [`ClientFactory`] for a client on every tool
//! call, so HTTP sessions can authenticate with their own bearer token.

use super::http::{ClientOptions, DigitalOceanClient};
use super::{ApiError, CloudApi};
use crate::tools::ToolContext;
use async_trait::async_trait;
use std::sync::Arc;

/// Errors while obtaining an upstream client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no DigitalOcean API token configured (set DIGITALOCEAN_API_TOKEN or send an Authorization header)")]
    MissingToken,
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] ApiError),
}

/// Source of upstream clients for the dispatcher.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn client(&self, ctx: &ToolContext) -> Result<Arc<dyn CloudApi>, ClientError>;
}

/// Builds a [`DigitalOceanClient`] per call from the request token or the
/// configured one.
pub struct TokenClientFactory {
    http: reqwest::Client,
    api_url: String,
    default_token: Option<String>,
}

impl TokenClientFactory {
    pub fn new(options: &ClientOptions, default_token: Option<String>) -> Result<Self, ClientError> {
        let http = DigitalOceanClient::http_client(options)?;
        Ok(Self {
            http,
            api_url: options.api_url.clone(),
            default_token: default_token.filter(|t| !t.is_empty()),
        })
    }

    fn token<'a>(&'a self, ctx: &'a ToolContext) -> Option<&'a str> {
        ctx.bearer_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.default_token.as_deref())
    }
}

#[async_trait]
impl ClientFactory for TokenClientFactory {
    async fn client(&self, ctx: &ToolContext) -> Result<Arc<dyn CloudApi>, ClientError> {
        let token = self.token(ctx).ok_or(ClientError::MissingToken)?;
        Ok(Arc::new(DigitalOceanClient::with_client(
            self.http.clone(),
            token,
            &self.api_url,
        )))
    }
}

/// Always hands out the same client.
pub struct StaticClientFactory {
    client: Arc<dyn CloudApi>,
}

impl StaticClientFactory {
    pub fn new(client: Arc<dyn CloudApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClientFactory for StaticClientFactory {
    async fn client(&self, _ctx: &ToolContext) -> Result<Arc<dyn CloudApi>, ClientError> {
        Ok(self.client.clone())
    }
}
