//! The account security read model.

use security_api::SecurityStatusResponse;
use serde::{Deserialize, Serialize};

/// One authentication method bound to the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// The account's password credential
    Password,
    /// An OAuth provider, by provider id
    OAuth(String),
}

/// A linked OAuth provider as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedProvider {
    pub id: String,
    /// Account identifier at the provider (email or handle), when known
    pub identifier: Option<String>,
}

/// Snapshot of the account's sign-in methods.
///
/// Snapshots are immutable values: every successful refresh replaces the
/// whole snapshot, and the linked-method count is always derived, never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSecurityStatus {
    pub password_linked: bool,
    pub linked_providers: Vec<LinkedProvider>,
}

impl AccountSecurityStatus {
    /// Whether the given provider is bound to the account.
    pub fn is_linked(&self, provider_id: &str) -> bool {
        self.linked_providers
            .iter()
            .any(|provider| provider.id == provider_id)
    }

    /// The linked provider entry, when bound.
    pub fn provider(&self, provider_id: &str) -> Option<&LinkedProvider> {
        self.linked_providers
            .iter()
            .find(|provider| provider.id == provider_id)
    }

    /// Every authentication method currently bound to the account.
    pub fn linked_methods(&self) -> Vec<AuthMethod> {
        let mut methods = Vec::with_capacity(self.linked_providers.len() + 1);
        if self.password_linked {
            methods.push(AuthMethod::Password);
        }
        methods.extend(
            self.linked_providers
                .iter()
                .map(|provider| AuthMethod::OAuth(provider.id.clone())),
        );
        methods
    }

    /// Number of usable sign-in methods.
    pub fn linked_method_count(&self) -> usize {
        usize::from(self.password_linked) + self.linked_providers.len()
    }

    /// True when removing this provider would leave the account with no
    /// sign-in method.
    pub fn is_sole_linked_method(&self, provider_id: &str) -> bool {
        self.linked_method_count() == 1 && self.is_linked(provider_id)
    }
}

impl From<SecurityStatusResponse> for AccountSecurityStatus {
    fn from(response: SecurityStatusResponse) -> Self {
        Self {
            password_linked: response.password_linked,
            linked_providers: response
                .providers
                .into_iter()
                .filter(|entry| entry.linked)
                .map(|entry| LinkedProvider {
                    id: entry.id,
                    identifier: entry.identifier,
                })
                .collect(),
        }
    }
}
