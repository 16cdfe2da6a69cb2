//! Wire types for the account security endpoints.
//!
//! The backend speaks camelCase JSON; every field name here is renamed on the
//! wire accordingly.

use serde::{Deserialize, Serialize};

/// One provider row in the security status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusEntry {
    /// Provider id (e.g. `google`, `github`)
    pub id: String,
    /// Whether this provider is currently bound to the account
    pub linked: bool,
    /// Account identifier at the provider (email or handle), when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Response body of `GET /account/security-status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStatusResponse {
    /// Whether a password credential is set on the account
    pub password_linked: bool,
    /// Per-provider link state
    pub providers: Vec<ProviderStatusEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_decodes_camel_case() {
        let json = r#"{
            "passwordLinked": true,
            "providers": [
                {"id": "github", "linked": true, "identifier": "octo@example.com"},
                {"id": "google", "linked": false}
            ]
        }"#;

        let status: SecurityStatusResponse = serde_json::from_str(json).unwrap();
        assert!(status.password_linked);
        assert_eq!(status.providers.len(), 2);
        assert_eq!(status.providers[0].id, "github");
        assert_eq!(
            status.providers[0].identifier.as_deref(),
            Some("octo@example.com")
        );
        assert!(!status.providers[1].linked);
        assert!(status.providers[1].identifier.is_none());
    }

    #[test]
    fn test_provider_entry_omits_missing_identifier() {
        let entry = ProviderStatusEntry {
            id: "google".to_string(),
            linked: true,
            identifier: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("identifier"));
    }
}
