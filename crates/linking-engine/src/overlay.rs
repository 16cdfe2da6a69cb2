//! Optimistic overlay applied on top of the authoritative security status.
//!
//! While a link is in flight the UI should already show the provider as
//! linked. The overlay is a pure read-model shadow: it only affects what
//! [`apply`](OptimisticOverlay::apply) returns, never the authoritative
//! snapshot, and the lockout check deliberately ignores it.

use security_status::{AccountSecurityStatus, LinkedProvider};

/// Identifier shown while the provider has not reported a real one yet.
pub const PENDING_IDENTIFIER: &str = "linking\u{2026}";

/// A single in-flight link rendered as if it had already landed.
///
/// At most one overlay exists at a time. It is installed when a link starts,
/// upgraded once the provider flow reports the account identifier, and
/// discarded when the operation fails or the next authoritative snapshot
/// arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticOverlay {
    provider_id: String,
    identifier: Option<String>,
}

impl OptimisticOverlay {
    /// Creates an overlay for a link in flight.
    pub fn for_link(provider_id: &str, identifier: Option<String>) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            identifier,
        }
    }

    /// The provider this overlay belongs to.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Projects the overlay onto a status snapshot.
    ///
    /// Starts from the given base (or an empty status when nothing has
    /// loaded yet) and adds the pending provider unless the base already
    /// lists it as linked.
    pub fn apply(&self, base: Option<&AccountSecurityStatus>) -> AccountSecurityStatus {
        let mut status = base.cloned().unwrap_or_default();
        if !status.is_linked(&self.provider_id) {
            status.linked_providers.push(LinkedProvider {
                id: self.provider_id.clone(),
                identifier: Some(
                    self.identifier
                        .clone()
                        .unwrap_or_else(|| PENDING_IDENTIFIER.to_string()),
                ),
            });
        }
        status
    }
}
