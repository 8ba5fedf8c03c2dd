//! Error types for the rollover daemon

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, RolloverError>;

/// Errors that can occur while loading configuration or talking to the engine
#[derive(Error, Debug)]
pub enum RolloverError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-success response from the engine
    #[error("engine returned status {status}: {body}")]
    Engine {
        /// HTTP status code reported by the engine
        status: u16,
        /// Response body, as returned (may be empty)
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RolloverError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an engine error from a response status and body
    pub fn engine(status: u16, body: impl Into<String>) -> Self {
        Self::Engine {
            status,
            body: body.into(),
        }
    }
}
