//! Image Request Client
//!
//! Issues one generation request per entity to
//! `POST {base_url}/{owning_context_id}/generate/image` and extracts the
//! artifact location from `data.image_url` in the response.

use crate::auth::AccessToken;
use crate::config::ServiceConfig;
use crate::entity::{EntityKind, ResolvedAgentEntity, ResolvedBuildingEntity};
use crate::error::{RequestFailure, SeedError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Printed in place of a URL when the response has no `data.image_url`.
pub const NO_URL: &str = "NO URL";

/// Type-specific request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtraPayload {
    Building { building_type: String },
    Agent { character: String, background: String },
}

/// The `extra` object: type-specific fields plus the literal prompt override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationExtra {
    #[serde(flatten)]
    pub payload: ExtraPayload,
    pub description_override: String,
}

/// One generation call. Built fresh per entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    /// Path segment, not part of the body.
    #[serde(skip)]
    pub owning_context_id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub entity_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<GenerationExtra>,
}

impl GenerationRequest {
    pub fn for_building(building: &ResolvedBuildingEntity, prompt: &str) -> Self {
        Self {
            owning_context_id: building.owning_context_id.clone(),
            entity_type: EntityKind::Building,
            entity_id: building.id.clone(),
            entity_name: building.name.clone(),
            extra: Some(GenerationExtra {
                payload: ExtraPayload::Building {
                    building_type: building.type_tag.clone(),
                },
                description_override: prompt.to_string(),
            }),
        }
    }

    pub fn for_agent(agent: &ResolvedAgentEntity, prompt: &str) -> Self {
        Self {
            owning_context_id: agent.owning_context_id.clone(),
            entity_type: EntityKind::Agent,
            entity_id: agent.id.clone(),
            entity_name: agent.name.clone(),
            extra: Some(GenerationExtra {
                payload: ExtraPayload::Agent {
                    character: agent.attributes.character.clone(),
                    background: agent.attributes.background.clone(),
                },
                description_override: prompt.to_string(),
            }),
        }
    }

    /// The prompt override carried by this request, if any.
    pub fn description_override(&self) -> Option<&str> {
        self.extra.as_ref().map(|e| e.description_override.as_str())
    }
}

/// Where the generated artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArtifactLocation {
    Url(String),
    /// The request succeeded but the response had no `data.image_url`.
    Missing,
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::Url(url) => f.write_str(url),
            ArtifactLocation::Missing => f.write_str(NO_URL),
        }
    }
}

/// Pull `data.image_url` out of a response body.
pub fn extract_artifact_location(body: &Value) -> ArtifactLocation {
    body.get("data")
        .and_then(|data| data.get("image_url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(|url| ArtifactLocation::Url(url.to_string()))
        .unwrap_or(ArtifactLocation::Missing)
}

#[async_trait]
pub trait ImageRequestClient: Send + Sync {
    async fn generate(
        &self,
        token: &AccessToken,
        request: &GenerationRequest,
    ) -> Result<ArtifactLocation, RequestFailure>;
}

/// reqwest-backed client for the generation endpoint.
pub struct HttpImageClient {
    client: Client,
    base_url: String,
}

impl HttpImageClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, SeedError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SeedError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, owning_context_id: &str) -> String {
        format!("{}/{}/generate/image", self.base_url, owning_context_id)
    }
}

#[async_trait]
impl ImageRequestClient for HttpImageClient {
    async fn generate(
        &self,
        token: &AccessToken,
        request: &GenerationRequest,
    ) -> Result<ArtifactLocation, RequestFailure> {
        let url = self.endpoint(&request.owning_context_id);
        debug!(
            url = %url,
            entity_type = %request.entity_type,
            entity_id = %request.entity_id,
            "Requesting image generation"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| RequestFailure::MalformedBody(e.to_string()))?;
        Ok(extract_artifact_location(&body))
    }
}
