//! Policy store error types.

use reqwest::StatusCode;

/// Errors from the policy store REST API.
#[derive(Debug, thiserror::Error)]
pub enum RangerError {
    /// Invalid client configuration.
    #[error("Invalid Ranger configuration: {0}")]
    InvalidConfig(String),

    /// The store answered with an unexpected HTTP status.
    #[error("Ranger {operation} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Operation that failed (export, import, delete).
        operation: &'static str,
        /// HTTP status the store returned.
        status: StatusCode,
        /// Response body, for the operator.
        body: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL construction failed.
    #[error("URL parsing failed: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Result type for policy store operations.
pub type RangerResult<T> = Result<T, RangerError>;
