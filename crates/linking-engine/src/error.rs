use provider_capability::CapabilityError;
use security_api::BackendError;
use thiserror::Error;

/// Errors surfaced to callers of the linking coordinator.
///
/// Every variant renders as a stable, user-presentable sentence. UI layers
/// display these messages verbatim, so changing one is a breaking change for
/// anything that snapshots them.
#[derive(Error, Debug)]
pub enum LinkingError {
    /// No capability is registered under the requested provider id.
    #[error("This sign-in provider is not available.")]
    ProviderUnknown,

    /// The provider capability has not finished initializing.
    #[error("This sign-in provider is still getting ready. Try again in a moment.")]
    ProviderNotReady,

    /// The provider capability failed to initialize.
    #[error("This sign-in provider couldn't start. Try again.")]
    ProviderUnavailable,

    /// A link or unlink for this provider is already running.
    #[error("Another operation for this provider is still in progress.")]
    OperationInFlight,

    /// Unlinking would leave the account with no way to sign in.
    #[error("You can't remove your only way to sign in. Add another sign-in method first.")]
    LockoutPrevented,

    /// No authoritative security status has loaded yet.
    #[error("Your security settings haven't loaded yet. Try again in a moment.")]
    StatusUnavailable,

    /// The provider is not linked to the account.
    #[error("This provider isn't linked to your account.")]
    NotLinked,

    /// The confirmation secret was empty or whitespace.
    #[error("Enter your password to confirm.")]
    EmptySecret,

    /// The confirmation flow already completed or was cancelled.
    #[error("This confirmation is no longer active.")]
    FlowClosed,

    /// The user dismissed the provider's sign-in flow.
    #[error("Sign-in was cancelled.")]
    FlowCancelled,

    /// The browser refused to open the provider's sign-in window.
    #[error("Your browser blocked the sign-in window. Allow pop-ups and try again.")]
    WindowBlocked,

    /// The operation exceeded its configured time budget.
    #[error("The operation timed out. Check your connection and try again.")]
    Timeout,

    /// The backend rejected the confirmation secret.
    #[error("That password is incorrect. Try again.")]
    SecretRejected,

    /// The backend refused the provider; its message is shown as-is.
    #[error("{0}")]
    ProviderUnsupported(String),

    /// Catch-all for failures with no more specific story.
    #[error("Something went wrong. Try again.")]
    OperationFailed,
}

impl LinkingError {
    /// True for failures detected before any backend or provider work starts.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LinkingError::ProviderUnknown
                | LinkingError::ProviderNotReady
                | LinkingError::OperationInFlight
                | LinkingError::LockoutPrevented
                | LinkingError::StatusUnavailable
                | LinkingError::NotLinked
                | LinkingError::EmptySecret
                | LinkingError::FlowClosed
        )
    }
}

impl From<CapabilityError> for LinkingError {
    fn from(error: CapabilityError) -> Self {
        match error {
            CapabilityError::NotReady => LinkingError::ProviderNotReady,
            CapabilityError::InitFailed(_) => LinkingError::ProviderUnavailable,
            CapabilityError::Busy => LinkingError::OperationInFlight,
            CapabilityError::Cancelled => LinkingError::FlowCancelled,
            CapabilityError::WindowBlocked => LinkingError::WindowBlocked,
            CapabilityError::Timeout => LinkingError::Timeout,
            _ => LinkingError::OperationFailed,
        }
    }
}

impl From<BackendError> for LinkingError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::InvalidSecret => LinkingError::SecretRejected,
            BackendError::UnsupportedProvider(message) => {
                LinkingError::ProviderUnsupported(message)
            }
            BackendError::LastMethod => LinkingError::LockoutPrevented,
            _ => LinkingError::OperationFailed,
        }
    }
}

pub type LinkingResult<T> = Result<T, LinkingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(LinkingError::ProviderUnknown.is_precondition());
        assert!(LinkingError::ProviderNotReady.is_precondition());
        assert!(LinkingError::OperationInFlight.is_precondition());
        assert!(LinkingError::LockoutPrevented.is_precondition());
        assert!(LinkingError::StatusUnavailable.is_precondition());
        assert!(LinkingError::NotLinked.is_precondition());
        assert!(LinkingError::EmptySecret.is_precondition());
        assert!(LinkingError::FlowClosed.is_precondition());

        assert!(!LinkingError::ProviderUnavailable.is_precondition());
        assert!(!LinkingError::FlowCancelled.is_precondition());
        assert!(!LinkingError::WindowBlocked.is_precondition());
        assert!(!LinkingError::Timeout.is_precondition());
        assert!(!LinkingError::SecretRejected.is_precondition());
        assert!(!LinkingError::OperationFailed.is_precondition());
    }

    #[test]
    fn test_capability_error_mapping() {
        assert!(matches!(
            LinkingError::from(CapabilityError::NotReady),
            LinkingError::ProviderNotReady
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::InitFailed("probe failed".to_string())),
            LinkingError::ProviderUnavailable
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::Busy),
            LinkingError::OperationInFlight
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::Cancelled),
            LinkingError::FlowCancelled
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::WindowBlocked),
            LinkingError::WindowBlocked
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::Timeout),
            LinkingError::Timeout
        ));
        assert!(matches!(
            LinkingError::from(CapabilityError::Flow("bad state".to_string())),
            LinkingError::OperationFailed
        ));
    }

    #[test]
    fn test_backend_error_mapping() {
        assert!(matches!(
            LinkingError::from(BackendError::InvalidSecret),
            LinkingError::SecretRejected
        ));
        assert!(matches!(
            LinkingError::from(BackendError::LastMethod),
            LinkingError::LockoutPrevented
        ));

        let unsupported = LinkingError::from(BackendError::UnsupportedProvider(
            "The gitlab provider is not enabled for this account.".to_string(),
        ));
        assert_eq!(
            unsupported.to_string(),
            "The gitlab provider is not enabled for this account."
        );
    }

    #[test]
    fn test_messages_are_stable() {
        assert_eq!(
            LinkingError::LockoutPrevented.to_string(),
            "You can't remove your only way to sign in. Add another sign-in method first."
        );
        assert_eq!(
            LinkingError::ProviderNotReady.to_string(),
            "This sign-in provider is still getting ready. Try again in a moment."
        );
        assert_eq!(
            LinkingError::Timeout.to_string(),
            "The operation timed out. Check your connection and try again."
        );
        assert_eq!(
            LinkingError::SecretRejected.to_string(),
            "That password is incorrect. Try again."
        );
    }
}
