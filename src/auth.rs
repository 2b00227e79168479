//! Session Authenticator
//!
//! Exchanges the fixed identity, secret and service key for a bearer token.
//! Called once per run; any failure is fatal.

use crate::config::{AuthConfig, ServiceConfig};
use crate::error::SeedError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Bearer token for the generation endpoint. Read-only for the whole run.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} chars>)", self.0.len())
    }
}

#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken, SeedError>;
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    identity: &'a str,
    secret: &'a str,
    api_key: &'a str,
}

#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// Authenticator for `POST {auth.url}/token-exchange`.
pub struct HttpAuthenticator {
    client: Client,
    config: AuthConfig,
}

impl HttpAuthenticator {
    pub fn new(config: AuthConfig, service: &ServiceConfig) -> Result<Self, SeedError> {
        let client = Client::builder()
            .connect_timeout(service.connect_timeout())
            .timeout(service.request_timeout())
            .build()
            .map_err(|e| SeedError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/token-exchange", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SessionAuthenticator for HttpAuthenticator {
    async fn authenticate(&self) -> Result<AccessToken, SeedError> {
        let url = self.endpoint();
        debug!(url = %url, identity = %self.config.identity, "Exchanging credentials");

        let response = self
            .client
            .post(&url)
            .json(&TokenExchangeRequest {
                identity: &self.config.identity,
                secret: &self.config.secret,
                api_key: &self.config.api_key,
            })
            .send()
            .await
            .map_err(|e| SeedError::Authentication(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SeedError::Authentication(format!(
                "token exchange returned {}: {}",
                status, body
            )));
        }

        let body: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| SeedError::Authentication(format!("invalid token response: {}", e)))?;
        if body.access_token.is_empty() {
            return Err(SeedError::Authentication(
                "token response carried an empty access_token".to_string(),
            ));
        }

        info!(identity = %self.config.identity, "Authenticated");
        Ok(AccessToken::new(body.access_token))
    }
}
