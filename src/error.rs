//! Error types for the image seeding batch.

use thiserror::Error;

/// Fatal errors. Any of these aborts the run before (or instead of) the
/// per-entity passes.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Entity resolution failed: {0}")]
    EntityResolution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt catalog error: {0}")]
    Catalog(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<config::ConfigError> for SeedError {
    fn from(err: config::ConfigError) -> Self {
        SeedError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        SeedError::EntityResolution(err.to_string())
    }
}

/// Per-entity request failures. Recorded in the batch report, never
/// propagated past the orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestFailure {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RequestFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RequestFailure::Timeout(error.to_string())
        } else if let Some(status) = error.status() {
            RequestFailure::Status {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else if error.is_decode() {
            RequestFailure::MalformedBody(error.to_string())
        } else if error.is_connect() {
            RequestFailure::Transport(format!("Connection error: {}", error))
        } else {
            RequestFailure::Transport(error.to_string())
        }
    }
}
