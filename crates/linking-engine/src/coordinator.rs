//! The linking coordinator.
//!
//! One coordinator serves the whole security settings surface. It owns a
//! state machine per provider, the single optimistic overlay, and the
//! preflight checks that keep an account from losing its last sign-in
//! method. Provider flows and backend writes are injected at construction,
//! so tests drive the coordinator end to end with in-memory fakes.
//!
//! Locking is deliberately coarse: the entry map and the overlay slot each
//! sit behind a `Mutex` that is only ever held for plain reads and writes,
//! never across an await and never while invoking callbacks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use provider_capability::{CapabilityTable, ProviderCapability};
use security_api::SecurityBackend;
use security_status::{AccountSecurityStatus, SecurityStatusStore};
use uuid::Uuid;

use crate::config::LinkingConfig;
use crate::error::{LinkingError, LinkingResult};
use crate::machine::{OperationInput, OperationMachine, OperationState};
use crate::overlay::OptimisticOverlay;

/// Invoked with the provider id after a link or unlink lands.
pub type LinkSuccessCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Invoked with the user-facing message when a link attempt fails.
pub type LinkErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Host callbacks, supplied once at construction.
pub struct LinkingCallbacks {
    pub on_success: LinkSuccessCallback,
    pub on_error: LinkErrorCallback,
}

impl LinkingCallbacks {
    /// Callbacks that ignore every notification.
    pub fn noop() -> Self {
        Self {
            on_success: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

/// Per-provider machine plus the message carried by its error state.
struct ProviderEntry {
    machine: OperationMachine,
    last_error: Option<String>,
}

impl ProviderEntry {
    fn new() -> Self {
        Self {
            machine: OperationMachine::new(),
            last_error: None,
        }
    }

    fn public_state(&self) -> OperationState {
        OperationState::from_machine(self.machine.state(), self.last_error.as_deref())
    }
}

/// Coordinates linking and unlinking of sign-in methods for one account.
pub struct LinkingCoordinator {
    capabilities: CapabilityTable,
    store: Arc<SecurityStatusStore>,
    backend: Arc<dyn SecurityBackend>,
    callbacks: LinkingCallbacks,
    config: LinkingConfig,
    entries: Mutex<HashMap<String, ProviderEntry>>,
    overlay: Arc<Mutex<Option<OptimisticOverlay>>>,
}

impl LinkingCoordinator {
    /// Builds a coordinator over the given capabilities, store, and backend.
    ///
    /// Registers a refresh listener on the store so that every authoritative
    /// snapshot discards the optimistic overlay.
    pub fn new(
        capabilities: CapabilityTable,
        store: Arc<SecurityStatusStore>,
        backend: Arc<dyn SecurityBackend>,
        callbacks: LinkingCallbacks,
        config: LinkingConfig,
    ) -> Self {
        let overlay: Arc<Mutex<Option<OptimisticOverlay>>> = Arc::new(Mutex::new(None));
        let listener_overlay = overlay.clone();
        store.add_refresh_listener(Box::new(move |_status| {
            if let Some(discarded) = listener_overlay.lock().unwrap().take() {
                tracing::debug!(
                    provider_id = %discarded.provider_id(),
                    "Overlay superseded by authoritative status"
                );
            }
        }));

        Self {
            capabilities,
            store,
            backend,
            callbacks,
            config,
            entries: Mutex::new(HashMap::new()),
            overlay,
        }
    }

    /// Starts a link flow for the provider and returns immediately.
    ///
    /// The outcome is reported through the construction-time callbacks; UI
    /// surfaces poll [`state_of`](Self::state_of) and
    /// [`status`](Self::status) for progress.
    pub fn link(self: &Arc<Self>, provider_id: &str) {
        let coordinator = self.clone();
        let provider_id = provider_id.to_string();
        tokio::spawn(async move {
            if let Err(error) = coordinator.link_now(&provider_id).await {
                tracing::debug!(
                    provider_id = %provider_id,
                    error = %error,
                    "Link attempt did not complete"
                );
            }
        });
    }

    /// Runs a link flow for the provider to completion.
    ///
    /// Acquires a credential through the provider capability, submits it to
    /// the backend, refreshes the authoritative status, and reports the
    /// outcome through the callbacks. A second request while one is running
    /// is dropped without invoking the error callback.
    pub async fn link_now(&self, provider_id: &str) -> LinkingResult<()> {
        let attempt_id = Uuid::new_v4();

        let Some(capability) = self.capabilities.get(provider_id) else {
            return self.reject_link(provider_id, attempt_id, LinkingError::ProviderUnknown);
        };
        if !capability.is_ready() {
            // Kick lazy initialization so a later attempt can succeed.
            let target = capability.clone();
            let init_provider = provider_id.to_string();
            tokio::spawn(async move {
                if let Err(error) = target.initialize().await {
                    tracing::warn!(
                        provider_id = %init_provider,
                        error = %error,
                        "Provider initialization failed"
                    );
                }
            });
            let error = LinkingError::ProviderNotReady;
            self.try_begin(provider_id, OperationInput::LinkRequested)?;
            self.settle(provider_id, OperationInput::Failed, Some(error.to_string()));
            return self.reject_link(provider_id, attempt_id, error);
        }

        self.try_begin(provider_id, OperationInput::LinkRequested)?;
        self.install_overlay(OptimisticOverlay::for_link(provider_id, None));
        tracing::info!(provider_id = %provider_id, attempt_id = %attempt_id, "Link started");

        match self.run_link(provider_id, capability.as_ref()).await {
            Ok(()) => {
                self.clear_overlay(provider_id);
                self.settle(provider_id, OperationInput::Succeeded, None);
                tracing::info!(
                    provider_id = %provider_id,
                    attempt_id = %attempt_id,
                    "Link completed"
                );
                self.store.refresh().await;
                (self.callbacks.on_success)(provider_id);
                Ok(())
            }
            Err(error) => {
                self.clear_overlay(provider_id);
                let message = error.to_string();
                self.settle(provider_id, OperationInput::Failed, Some(message.clone()));
                tracing::warn!(
                    provider_id = %provider_id,
                    attempt_id = %attempt_id,
                    error = %message,
                    "Link failed"
                );
                (self.callbacks.on_error)(&message);
                Err(error)
            }
        }
    }

    async fn run_link(
        &self,
        provider_id: &str,
        capability: &dyn ProviderCapability,
    ) -> LinkingResult<()> {
        let credential = tokio::time::timeout(
            self.config.acquire_timeout,
            capability.acquire_credential(),
        )
        .await
        .map_err(|_| LinkingError::Timeout)?
        .map_err(|error| {
            if error.is_user_action() {
                tracing::info!(
                    provider_id = %provider_id,
                    error = %error,
                    "Provider flow ended by user"
                );
            } else {
                tracing::warn!(provider_id = %provider_id, error = %error, "Provider flow failed");
            }
            LinkingError::from(error)
        })?;

        // The provider told us who the user is; show that instead of the
        // placeholder while the backend call runs.
        if credential.identifier.is_some() {
            self.install_overlay(OptimisticOverlay::for_link(
                provider_id,
                credential.identifier.clone(),
            ));
        }

        tokio::time::timeout(
            self.config.link_timeout,
            self.backend.link_provider(provider_id, &credential.token),
        )
        .await
        .map_err(|_| LinkingError::Timeout)?
        .map_err(LinkingError::from)
    }

    /// Removes a linked provider, authorized by a reauthentication secret.
    ///
    /// Runs the full preflight first; preflight failures leave the provider
    /// state untouched. Failures of the backend call itself return the
    /// provider to idle, since the confirmation flow that collected the
    /// secret owns the error presentation.
    pub async fn unlink(&self, provider_id: &str, secret: &str) -> LinkingResult<()> {
        let attempt_id = Uuid::new_v4();

        self.unlink_preflight(provider_id)?;
        self.try_begin(provider_id, OperationInput::UnlinkRequested)?;
        tracing::info!(provider_id = %provider_id, attempt_id = %attempt_id, "Unlink started");

        let outcome = tokio::time::timeout(
            self.config.unlink_timeout,
            self.backend.unlink_provider(provider_id, secret),
        )
        .await
        .map_err(|_| LinkingError::Timeout)
        .and_then(|result| result.map_err(LinkingError::from));

        match outcome {
            Ok(()) => {
                self.settle(provider_id, OperationInput::Succeeded, None);
                tracing::info!(
                    provider_id = %provider_id,
                    attempt_id = %attempt_id,
                    "Unlink completed"
                );
                self.store.refresh().await;
                (self.callbacks.on_success)(provider_id);
                Ok(())
            }
            Err(error) => {
                self.settle(provider_id, OperationInput::Failed, None);
                tracing::warn!(
                    provider_id = %provider_id,
                    attempt_id = %attempt_id,
                    error = %error,
                    "Unlink failed"
                );
                Err(error)
            }
        }
    }

    /// Checks whether an unlink could start right now.
    ///
    /// Evaluated against the authoritative status only; the optimistic
    /// overlay never counts toward the lockout check. Read-only, so UI
    /// surfaces call it to disable remove buttons.
    pub fn unlink_preflight(&self, provider_id: &str) -> LinkingResult<()> {
        if self.capabilities.get(provider_id).is_none() {
            return Err(LinkingError::ProviderUnknown);
        }
        if self.state_of(provider_id).is_in_flight() {
            return Err(LinkingError::OperationInFlight);
        }
        let Some(status) = self.store.current() else {
            return Err(LinkingError::StatusUnavailable);
        };
        if !status.is_linked(provider_id) {
            return Err(LinkingError::NotLinked);
        }
        if status.is_sole_linked_method(provider_id) {
            return Err(LinkingError::LockoutPrevented);
        }
        Ok(())
    }

    /// Clears a terminal initialization failure and initializes again.
    pub async fn retry_provider_init(&self, provider_id: &str) -> LinkingResult<()> {
        let capability = self
            .capabilities
            .get(provider_id)
            .ok_or(LinkingError::ProviderUnknown)?;
        capability.retry_init().await.map_err(|error| {
            tracing::warn!(
                provider_id = %provider_id,
                error = %error,
                "Provider initialization retry failed"
            );
            LinkingError::from(error)
        })
    }

    /// The effective security status: authoritative snapshot plus overlay.
    ///
    /// `None` until the first refresh lands, unless a link is already in
    /// flight, in which case the overlay alone is shown.
    pub fn status(&self) -> Option<AccountSecurityStatus> {
        let authoritative = self.store.current();
        let overlay = self.overlay.lock().unwrap();
        match overlay.as_ref() {
            Some(overlay) => Some(overlay.apply(authoritative.as_ref())),
            None => authoritative,
        }
    }

    /// Whether the provider shows as linked in the effective status.
    pub fn is_linked(&self, provider_id: &str) -> bool {
        self.status()
            .map(|status| status.is_linked(provider_id))
            .unwrap_or(false)
    }

    /// The provider's current operation state.
    pub fn state_of(&self, provider_id: &str) -> OperationState {
        let entries = self.entries.lock().unwrap();
        entries
            .get(provider_id)
            .map(ProviderEntry::public_state)
            .unwrap_or(OperationState::Idle)
    }

    /// Dismisses a provider's error state.
    pub fn clear_error(&self, provider_id: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(provider_id) {
            if entry.machine.consume(&OperationInput::Acknowledged).is_ok() {
                entry.last_error = None;
            }
        }
    }

    /// Whether the provider capability finished initializing.
    pub fn is_provider_ready(&self, provider_id: &str) -> bool {
        self.capabilities
            .get(provider_id)
            .map(|capability| capability.is_ready())
            .unwrap_or(false)
    }

    /// Registered provider ids.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.capabilities.ids()
    }

    fn reject_link(
        &self,
        provider_id: &str,
        attempt_id: Uuid,
        error: LinkingError,
    ) -> LinkingResult<()> {
        let message = error.to_string();
        tracing::info!(
            provider_id = %provider_id,
            attempt_id = %attempt_id,
            reason = %message,
            "Link rejected"
        );
        (self.callbacks.on_error)(&message);
        Err(error)
    }

    fn try_begin(&self, provider_id: &str, input: OperationInput) -> LinkingResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(provider_id.to_string())
            .or_insert_with(ProviderEntry::new);
        match entry.machine.consume(&input) {
            Ok(_) => {
                entry.last_error = None;
                Ok(())
            }
            Err(_) => {
                tracing::debug!(
                    provider_id = %provider_id,
                    state = ?entry.machine.state(),
                    requested = ?input,
                    "Operation dropped: another one is in flight"
                );
                Err(LinkingError::OperationInFlight)
            }
        }
    }

    fn settle(&self, provider_id: &str, input: OperationInput, message: Option<String>) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(provider_id) {
            match entry.machine.consume(&input) {
                Ok(_) => entry.last_error = message,
                Err(_) => {
                    tracing::debug!(
                        provider_id = %provider_id,
                        state = ?entry.machine.state(),
                        input = ?input,
                        "Ignoring settle for an operation that is not running"
                    );
                }
            }
        }
    }

    fn install_overlay(&self, overlay: OptimisticOverlay) {
        *self.overlay.lock().unwrap() = Some(overlay);
    }

    fn clear_overlay(&self, provider_id: &str) {
        let mut slot = self.overlay.lock().unwrap();
        if slot
            .as_ref()
            .is_some_and(|overlay| overlay.provider_id() == provider_id)
        {
            *slot = None;
        }
    }
}
