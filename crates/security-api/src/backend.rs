//! The backend seam for account security operations.

use crate::error::BackendResult;
use crate::types::SecurityStatusResponse;
use async_trait::async_trait;

/// Backend operations the linking subsystem depends on.
///
/// Production code talks to the Terrace REST API through
/// [`HttpSecurityBackend`](crate::HttpSecurityBackend); tests substitute an
/// in-memory implementation of this trait.
#[async_trait]
pub trait SecurityBackend: Send + Sync {
    /// Fetch the authoritative security status for the signed-in account.
    async fn fetch_security_status(&self) -> BackendResult<SecurityStatusResponse>;

    /// Bind a provider credential to the account.
    async fn link_provider(&self, provider_id: &str, credential: &str) -> BackendResult<()>;

    /// Remove a linked provider, authorized by a fresh reauthentication secret.
    async fn unlink_provider(&self, provider_id: &str, secret: &str) -> BackendResult<()>;
}
