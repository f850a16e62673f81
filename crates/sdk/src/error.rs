//! Error types for the Toolbus SDK.

use toolbus_core::{ErrorCode, McpError};

/// Result type for SDK operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the Toolbus client.
///
/// These are transport-level failures; a logical tool failure
/// (`ToolResult::is_error`) is returned as data, never as a `ClientError`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered non-2xx with a protocol error.
    #[error("Server error (status {status}): {error}")]
    Protocol { status: u16, error: McpError },

    /// An attempt exceeded its time budget.
    #[error("Request timed out")]
    Timeout,

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Whether retrying this error could plausibly succeed.
    ///
    /// Validation-class protocol codes can never succeed on retry, so they
    /// fail fast instead of burning the backoff ladder.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Protocol { error, .. } => matches!(
                error.code,
                ErrorCode::RateLimitExceeded | ErrorCode::InternalError
            ),
            _ => false,
        }
    }

    /// Build a protocol error from a non-2xx response body.
    ///
    /// Uses the server-supplied `{message, code}` when present, otherwise a
    /// generic `InternalError` for the status.
    pub fn from_response(status: u16, body: &str) -> Self {
        let error = serde_json::from_str::<McpError>(body)
            .unwrap_or_else(|_| McpError::internal(format!("Request failed: {}", status)));
        Self::Protocol { status, error }
    }
}
