//! Configuration System
//!
//! Process-wide settings loaded once at startup: service endpoints, fixed
//! credentials, store connection, catalog overrides, pacing and logging.
//! Layered from defaults, config files and `IMAGESEED__*` environment variables.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fixed identity used for the token exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Auth service base URL; `/token-exchange` is appended.
    #[serde(default = "default_auth_url")]
    pub url: String,

    #[serde(default)]
    pub identity: String,

    #[serde(default)]
    pub secret: String,

    #[serde(default)]
    pub api_key: String,
}

fn default_auth_url() -> String {
    "http://localhost:8000/api/v1/auth".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
            identity: String::new(),
            secret: String::new(),
            api_key: String::new(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Image generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL; requests go to `{base_url}/{owning_context_id}/generate/image`.
    #[serde(default = "default_service_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_service_url() -> String {
    "http://localhost:8000/api/v1/simulations".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Persistent store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Category marker selecting the buildings to seed.
    #[serde(default = "default_building_category")]
    pub building_category: String,
}

fn default_database_url() -> String {
    "postgres://localhost:5432/simulations".to_string()
}

fn default_max_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn default_building_category() -> String {
    "embassy".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            building_category: default_building_category(),
        }
    }
}

/// Optional replacement prompt tables. `None` uses the embedded table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub buildings: Option<PathBuf>,

    #[serde(default)]
    pub agents: Option<PathBuf>,
}

/// Batch pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Delay between consecutive generation requests, in seconds.
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: f64,
}

fn default_pacing_secs() -> f64 {
    2.0
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            pacing_secs: default_pacing_secs(),
        }
    }
}

impl BatchConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_secs_f64(self.pacing_secs.max(0.0))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Auth(String),
    Service(String),
    Store(String),
    Batch(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Auth(msg) => write!(f, "auth: {}", msg),
            ValidationError::Service(msg) => write!(f, "service: {}", msg),
            ValidationError::Store(msg) => write!(f, "store: {}", msg),
            ValidationError::Batch(msg) => write!(f, "batch: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn check_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| format!("invalid URL '{}': {}", url, e))
}

impl SeedConfig {
    /// Validate the configuration. Credentials are only required when the run
    /// will authenticate.
    pub fn validate(&self, require_credentials: bool) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if require_credentials {
            if let Err(e) = check_url(&self.auth.url) {
                errors.push(ValidationError::Auth(e));
            }
            for (field, value) in [
                ("identity", &self.auth.identity),
                ("secret", &self.auth.secret),
                ("api_key", &self.auth.api_key),
            ] {
                if value.is_empty() {
                    errors.push(ValidationError::Auth(format!("{} is not set", field)));
                }
            }
            if let Err(e) = check_url(&self.service.base_url) {
                errors.push(ValidationError::Service(e));
            }
            if self.service.request_timeout_secs == 0 {
                errors.push(ValidationError::Service(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
        }

        if self.store.database_url.trim().is_empty() {
            errors.push(ValidationError::Store("database_url cannot be empty".to_string()));
        }
        if self.store.building_category.trim().is_empty() {
            errors.push(ValidationError::Store(
                "building_category cannot be empty".to_string(),
            ));
        }
        if self.store.max_connections == 0 {
            errors.push(ValidationError::Store(
                "max_connections must be greater than zero".to_string(),
            ));
        }

        if !self.batch.pacing_secs.is_finite() || self.batch.pacing_secs < 0.0 {
            errors.push(ValidationError::Batch(format!(
                "pacing_secs must be a non-negative number, got {}",
                self.batch.pacing_secs
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
