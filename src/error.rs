//! Error types shared across the refresh cycle

use thiserror::Error;

/// Result type alias for metric source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for chat collaborator operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors a metric source can fail with
///
/// None of these are retried in place; the next scheduler tick is the retry.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network fault or timeout, usually transient
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with an application-level error
    #[error("source rejected the request: {0}")]
    Rejected(String),

    /// The response did not have the expected shape
    #[error("malformed source response: {0}")]
    Malformed(String),
}

/// Errors returned by the chat collaborator
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

/// Startup configuration faults; these abort the process before the first tick
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}
