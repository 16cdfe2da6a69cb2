//! REST client for the Terrace account security endpoints.
//!
//! Endpoints used:
//! - `GET  /account/security-status`
//! - `POST /account/link-provider`
//! - `POST /account/unlink-provider`
//!
//! The session bearer token is supplied by the embedding application; this
//! client only holds the most recently provided one.

use crate::backend::SecurityBackend;
use crate::error::{BackendError, BackendResult};
use crate::types::SecurityStatusResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use url::Url;

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Structured error body returned by the security endpoints.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Request body for `POST /account/link-provider`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkProviderRequest<'a> {
    provider_id: &'a str,
    credential: &'a str,
}

/// Request body for `POST /account/unlink-provider`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnlinkProviderRequest<'a> {
    provider_id: &'a str,
    secret: &'a str,
}

/// HTTP implementation of [`SecurityBackend`].
pub struct HttpSecurityBackend {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Mutex<Option<String>>,
}

impl HttpSecurityBackend {
    /// Create a new client for the given API base URL
    /// (e.g. `https://api.terrace.dev`).
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let base_url = base_url.into();
        // Reject malformed configuration before the first request.
        Url::parse(&base_url)?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: Mutex::new(None),
        })
    }

    /// Supply the session bearer token used on subsequent requests.
    pub fn set_bearer_token(&self, token: impl Into<String>) {
        let mut slot = self.bearer_token.lock().unwrap();
        *slot = Some(token.into());
    }

    /// Drop the stored bearer token (e.g. on sign-out).
    pub fn clear_bearer_token(&self) {
        let mut slot = self.bearer_token.lock().unwrap();
        *slot = None;
    }

    /// Build the URL for an account endpoint.
    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/account/{}", self.base_url, endpoint)
    }

    fn auth_header(&self) -> Option<String> {
        let slot = self.bearer_token.lock().unwrap();
        slot.as_ref().map(|token| format!("Bearer {}", token))
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_header() {
            Some(value) => request.header("Authorization", value),
            None => request,
        }
    }

    /// Map a non-success response to a typed error.
    ///
    /// Known backend codes become dedicated variants; everything else is a
    /// generic rejection whose body is logged as a summary, never echoed.
    async fn map_error_response(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            match parsed.code.as_str() {
                "invalid_secret" => return BackendError::InvalidSecret,
                "unsupported_provider" => {
                    return BackendError::UnsupportedProvider(parsed.message)
                }
                "last_method" => return BackendError::LastMethod,
                _ => {}
            }
        }

        let body_summary = summarize_response_body(&body);
        tracing::error!(status = %status, body_summary = %body_summary, "Security endpoint rejected request");
        BackendError::Rejected {
            status,
            body_summary,
        }
    }
}

#[async_trait]
impl SecurityBackend for HttpSecurityBackend {
    async fn fetch_security_status(&self) -> BackendResult<SecurityStatusResponse> {
        let url = self.endpoint_url("security-status");
        tracing::debug!("Fetching account security status");

        let response = self
            .apply_auth(self.http_client.get(&url))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error_response(response).await);
        }

        let status: SecurityStatusResponse = response.json().await?;
        tracing::debug!(
            password_linked = status.password_linked,
            provider_count = status.providers.len(),
            "Fetched account security status"
        );
        Ok(status)
    }

    async fn link_provider(&self, provider_id: &str, credential: &str) -> BackendResult<()> {
        let url = self.endpoint_url("link-provider");
        tracing::debug!(provider_id = %provider_id, "Submitting provider link");

        let response = self
            .apply_auth(self.http_client.post(&url))
            .header("Content-Type", "application/json")
            .json(&LinkProviderRequest {
                provider_id,
                credential,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error_response(response).await);
        }

        tracing::info!(provider_id = %provider_id, "Provider linked");
        Ok(())
    }

    async fn unlink_provider(&self, provider_id: &str, secret: &str) -> BackendResult<()> {
        let url = self.endpoint_url("unlink-provider");
        tracing::debug!(provider_id = %provider_id, "Submitting provider unlink");

        let response = self
            .apply_auth(self.http_client.post(&url))
            .header("Content-Type", "application/json")
            .json(&UnlinkProviderRequest {
                provider_id,
                secret,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error_response(response).await);
        }

        tracing::info!(provider_id = %provider_id, "Provider unlinked");
        Ok(())
    }
}
