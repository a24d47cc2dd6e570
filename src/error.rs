use thiserror::Error;

/// Errors raised while loading configuration from the environment
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors crossing the collaborator boundary (model, store, chat)
///
/// The date normalizer and the bucketizer never produce these; every
/// degenerate input there has a silent fallback.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Model reply does not contain JSON: {0}")]
    NoJson(String),

    #[error("Invalid JSON returned by model: {0}")]
    InvalidJson(String),

    #[error("Task store request failed: {0}")]
    Store(String),

    #[error("Chat push failed: {0}")]
    Push(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
