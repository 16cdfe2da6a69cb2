//! Account security API error types.

use thiserror::Error;

/// Error type for security backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The reauthentication secret was rejected
    #[error("Invalid secret")]
    InvalidSecret,

    /// The backend cannot link or unlink this provider; carries the
    /// backend's category message
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    /// The backend refused to remove the last remaining sign-in method
    #[error("Last sign-in method")]
    LastMethod,

    /// Any other non-success response
    #[error("Request failed: {status} ({body_summary})")]
    Rejected {
        status: reqwest::StatusCode,
        body_summary: String,
    },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BackendError {
    /// Returns true if this error is transient and the request can be retried.
    ///
    /// Transient errors include:
    /// - Connection failures and timeouts
    /// - 5xx server responses
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Rejected { status, .. } => status.is_server_error(),
            BackendError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using BackendError.
pub type BackendResult<T> = Result<T, BackendError>;
