//! The provider capability seam.

use crate::descriptor::ProviderDescriptor;
use crate::error::CapabilityResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// How the embedding application opens the provider's authorization page.
///
/// Returns false when the page could not be opened (e.g. popup blocked).
pub type AuthorizePageOpener = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Credential produced by a completed provider flow.
#[derive(Debug, Clone)]
pub struct AcquiredCredential {
    /// Opaque token the backend verifies during linking
    pub token: String,
    /// Account identifier at the provider (email or handle), when reported
    pub identifier: Option<String>,
}

/// Tunable bounds for provider initialization and credential acquisition.
#[derive(Debug, Clone)]
pub struct CapabilityConfig {
    /// Overall bound on lazy initialization
    pub init_timeout: Duration,
    /// Delay between readiness probes during initialization
    pub init_poll_interval: Duration,
    /// Overall bound on one credential acquisition
    pub acquire_timeout: Duration,
    /// Delay between flow status polls
    pub poll_interval: Duration,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_secs(30),
            init_poll_interval: Duration::from_secs(2),
            acquire_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// A sign-in provider the account can link.
///
/// Implementations are opaque to the coordinator: they produce a credential
/// or fail. Readiness and busy state are observable so callers can gate
/// operations without touching the network.
#[async_trait]
pub trait ProviderCapability: Send + Sync {
    /// Static descriptor for this provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Whether initialization finished and a flow can start.
    fn is_ready(&self) -> bool;

    /// Whether a flow is currently running.
    fn is_busy(&self) -> bool;

    /// Last initialization or flow error, for diagnostics surfaces.
    fn last_error(&self) -> Option<String>;

    /// Run lazy initialization until ready or the configured window elapses.
    ///
    /// Idempotent: repeated calls after success are no-ops, and a terminal
    /// failure is returned as-is until [`retry_init`](Self::retry_init).
    async fn initialize(&self) -> CapabilityResult<()>;

    /// Clear a terminal initialization failure and initialize again.
    async fn retry_init(&self) -> CapabilityResult<()>;

    /// Run the provider flow to produce a credential.
    async fn acquire_credential(&self) -> CapabilityResult<AcquiredCredential>;
}
