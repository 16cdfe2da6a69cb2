//! Reauthentication confirmation flow for unlinking.
//!
//! Removing a sign-in method is destructive, so the UI collects a fresh
//! password before asking the coordinator to unlink. A [`ReauthFlow`] models
//! one confirmation dialog: it opens only when the unlink could actually
//! proceed, validates the secret locally, and relays the coordinator's
//! outcome. The secret itself is passed straight through and never stored.

use std::sync::{Arc, Mutex};

use crate::coordinator::LinkingCoordinator;
use crate::error::{LinkingError, LinkingResult};

/// Where a confirmation dialog is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReauthPhase {
    /// Waiting for the user to enter their password.
    Collecting,
    /// The unlink request is running.
    Submitting,
    /// The unlink landed; the dialog should close.
    Done,
    /// The last submission failed; carries the message to show. The user
    /// can correct the password and submit again.
    Failed(String),
    /// The user dismissed the dialog.
    Cancelled,
}

/// One open confirmation dialog for removing a sign-in method.
pub struct ReauthFlow {
    coordinator: Arc<LinkingCoordinator>,
    provider_id: String,
    phase: Mutex<ReauthPhase>,
}

impl ReauthFlow {
    /// Opens a confirmation flow for unlinking the given provider.
    ///
    /// Runs the unlink preflight first: a flow never opens for an unlink
    /// that would be refused anyway (unknown provider, lockout, operation
    /// already in flight, status not loaded).
    pub fn open(coordinator: Arc<LinkingCoordinator>, provider_id: &str) -> LinkingResult<Self> {
        coordinator.unlink_preflight(provider_id)?;
        tracing::debug!(provider_id = %provider_id, "Unlink confirmation opened");
        Ok(Self {
            coordinator,
            provider_id: provider_id.to_string(),
            phase: Mutex::new(ReauthPhase::Collecting),
        })
    }

    /// The provider this flow would unlink.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// The current phase, for rendering.
    pub fn phase(&self) -> ReauthPhase {
        self.phase.lock().unwrap().clone()
    }

    /// Submits the collected secret and runs the unlink.
    ///
    /// An empty or whitespace secret fails locally without touching the
    /// coordinator. A failed submission leaves the flow open so the user can
    /// try again; a completed or cancelled flow rejects further submissions.
    pub async fn submit(&self, secret: &str) -> LinkingResult<()> {
        {
            let mut phase = self.phase.lock().unwrap();
            match *phase {
                ReauthPhase::Submitting => return Err(LinkingError::OperationInFlight),
                ReauthPhase::Done | ReauthPhase::Cancelled => {
                    return Err(LinkingError::FlowClosed)
                }
                ReauthPhase::Collecting | ReauthPhase::Failed(_) => {}
            }
            if secret.trim().is_empty() {
                let error = LinkingError::EmptySecret;
                *phase = ReauthPhase::Failed(error.to_string());
                return Err(error);
            }
            *phase = ReauthPhase::Submitting;
        }

        match self.coordinator.unlink(&self.provider_id, secret).await {
            Ok(()) => {
                *self.phase.lock().unwrap() = ReauthPhase::Done;
                Ok(())
            }
            Err(error) => {
                *self.phase.lock().unwrap() = ReauthPhase::Failed(error.to_string());
                Err(error)
            }
        }
    }

    /// Dismisses the dialog.
    ///
    /// Ignored while a submission is running and after the flow closed.
    pub fn cancel(&self) {
        let mut phase = self.phase.lock().unwrap();
        if matches!(*phase, ReauthPhase::Collecting | ReauthPhase::Failed(_)) {
            tracing::debug!(provider_id = %self.provider_id, "Unlink confirmation dismissed");
            *phase = ReauthPhase::Cancelled;
        }
    }
}
