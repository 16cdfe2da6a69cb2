//! Provider capability error types.

use thiserror::Error;

/// Error type for provider initialization and credential acquisition.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Initialization has not completed for this provider
    #[error("Provider not ready")]
    NotReady,

    /// Initialization gave up after the configured window
    #[error("Provider initialization failed: {0}")]
    InitFailed(String),

    /// An acquisition is already running for this provider
    #[error("Provider is busy")]
    Busy,

    /// The user dismissed the provider flow
    #[error("Sign-in was cancelled")]
    Cancelled,

    /// The authorization page could not be opened
    #[error("Sign-in window was blocked")]
    WindowBlocked,

    /// The flow did not complete inside the configured window
    #[error("Operation timed out")]
    Timeout,

    /// Failure reported by the flow service
    #[error("Provider flow error: {0}")]
    Flow(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CapabilityError {
    /// Returns true when the failure came from the user's own action
    /// rather than from the provider or the network.
    pub fn is_user_action(&self) -> bool {
        matches!(
            self,
            CapabilityError::Cancelled | CapabilityError::WindowBlocked
        )
    }
}

/// Result type alias using CapabilityError.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
