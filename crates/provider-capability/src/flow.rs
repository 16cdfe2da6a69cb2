//! Shared remote-flow engine behind every built-in provider.
//!
//! One sign-in flow runs against the Terrace flow service:
//! 1. `POST {start_path}` with a fresh flow id; the response carries the
//!    authorization URL the embedding application opens for the user.
//! 2. `GET {status_path}?flowId=...` is polled until the flow reports a
//!    terminal status or the acquisition window elapses.
//!
//! Initialization polls the provider's readiness probe until it answers or
//! the init window elapses; after that the capability stays failed until
//! `retry_init`.

use crate::capability::{
    AcquiredCredential, AuthorizePageOpener, CapabilityConfig, ProviderCapability,
};
use crate::descriptor::{FlowEndpoints, ProviderDescriptor};
use crate::error::{CapabilityError, CapabilityResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlowStartRequest<'a> {
    flow_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowStartResponse {
    authorize_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowStatusResponse {
    status: String,
    #[serde(default)]
    credential: Option<FlowCredential>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlowCredential {
    token: String,
    #[serde(default)]
    identifier: Option<String>,
}

/// Resets the busy flag when the acquisition future completes or is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Generic [`ProviderCapability`] over the flow service.
///
/// The built-in adapters differ only in descriptor and endpoint paths; all
/// flow mechanics live here.
pub struct RemoteFlowCapability {
    descriptor: &'static ProviderDescriptor,
    endpoints: &'static FlowEndpoints,
    http_client: reqwest::Client,
    service_url: String,
    opener: AuthorizePageOpener,
    config: CapabilityConfig,
    ready: AtomicBool,
    busy: AtomicBool,
    init_failed: AtomicBool,
    init_lock: tokio::sync::Mutex<()>,
    last_error: Mutex<Option<String>>,
}

impl RemoteFlowCapability {
    /// Create a capability over the given flow service URL
    /// (e.g. `https://auth.terrace.dev`).
    pub fn new(
        descriptor: &'static ProviderDescriptor,
        endpoints: &'static FlowEndpoints,
        service_url: impl Into<String>,
        opener: AuthorizePageOpener,
        config: CapabilityConfig,
    ) -> CapabilityResult<Self> {
        let service_url = service_url.into();
        Url::parse(&service_url)?;
        Ok(Self {
            descriptor,
            endpoints,
            http_client: reqwest::Client::new(),
            service_url: service_url.trim_end_matches('/').to_string(),
            opener,
            config,
            ready: AtomicBool::new(false),
            busy: AtomicBool::new(false),
            init_failed: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
            last_error: Mutex::new(None),
        })
    }

    fn flow_url(&self, path: &str) -> String {
        format!("{}/{}", self.service_url, path)
    }

    fn record_error(&self, message: impl Into<String>) {
        let mut slot = self.last_error.lock().unwrap();
        *slot = Some(message.into());
    }

    async fn probe_once(&self, probe_url: &str) -> CapabilityResult<()> {
        let response = self.http_client.get(probe_url).send().await?;
        if !response.status().is_success() {
            return Err(CapabilityError::Flow(format!(
                "Probe answered {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Probe until the flow service answers; the caller bounds the loop.
    async fn probe_until_ready(&self) -> CapabilityResult<()> {
        let probe_url = self.flow_url(self.endpoints.probe_path);
        loop {
            match self.probe_once(&probe_url).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    tracing::debug!(
                        provider_id = %self.descriptor.id,
                        error = %error,
                        "Provider readiness probe failed, retrying"
                    );
                    tokio::time::sleep(self.config.init_poll_interval).await;
                }
            }
        }
    }

    async fn run_flow(&self) -> CapabilityResult<AcquiredCredential> {
        let flow_id = Uuid::new_v4().to_string();
        let start_url = self.flow_url(self.endpoints.start_path);

        let response = self
            .http_client
            .post(&start_url)
            .header("Content-Type", "application/json")
            .json(&FlowStartRequest { flow_id: &flow_id })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CapabilityError::Flow(format!(
                "Flow start rejected: {}",
                response.status()
            )));
        }
        let start: FlowStartResponse = response.json().await?;

        tracing::info!(
            provider_id = %self.descriptor.id,
            flow_id = %flow_id,
            "Opening provider authorization page"
        );
        if !(self.opener)(&start.authorize_url) {
            return Err(CapabilityError::WindowBlocked);
        }

        let status_url = format!(
            "{}?flowId={}",
            self.flow_url(self.endpoints.status_path),
            flow_id
        );

        loop {
            let response = self.http_client.get(&status_url).send().await?;
            let payload: FlowStatusResponse = response.json().await?;

            match payload.status.as_str() {
                "pending" => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                "complete" => {
                    let credential = payload.credential.ok_or_else(|| {
                        CapabilityError::Flow("Missing credential payload".to_string())
                    })?;
                    return Ok(AcquiredCredential {
                        token: credential.token,
                        identifier: credential.identifier,
                    });
                }
                "cancelled" => return Err(CapabilityError::Cancelled),
                "blocked" => return Err(CapabilityError::WindowBlocked),
                other => {
                    let error = payload.error.unwrap_or_else(|| "unknown error".to_string());
                    return Err(CapabilityError::Flow(format!(
                        "Flow failed ({}): {}",
                        other, error
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl ProviderCapability for RemoteFlowCapability {
    fn descriptor(&self) -> &ProviderDescriptor {
        self.descriptor
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    async fn initialize(&self) -> CapabilityResult<()> {
        if self.is_ready() {
            return Ok(());
        }

        // One probe loop at a time; late entrants see the outcome.
        let _guard = self.init_lock.lock().await;
        if self.is_ready() {
            return Ok(());
        }
        if self.init_failed.load(Ordering::Acquire) {
            let message = self
                .last_error()
                .unwrap_or_else(|| "initialization previously failed".to_string());
            return Err(CapabilityError::InitFailed(message));
        }

        match tokio::time::timeout(self.config.init_timeout, self.probe_until_ready()).await {
            Ok(Ok(())) => {
                self.ready.store(true, Ordering::Release);
                *self.last_error.lock().unwrap() = None;
                tracing::info!(provider_id = %self.descriptor.id, "Provider ready");
                Ok(())
            }
            Ok(Err(error)) => {
                let message = format!("Initialization failed: {}", error);
                self.init_failed.store(true, Ordering::Release);
                self.record_error(message.clone());
                Err(CapabilityError::InitFailed(message))
            }
            Err(_) => {
                let message = "Initialization timed out".to_string();
                self.init_failed.store(true, Ordering::Release);
                self.record_error(message.clone());
                tracing::warn!(provider_id = %self.descriptor.id, "Provider initialization timed out");
                Err(CapabilityError::InitFailed(message))
            }
        }
    }

    async fn retry_init(&self) -> CapabilityResult<()> {
        self.init_failed.store(false, Ordering::Release);
        *self.last_error.lock().unwrap() = None;
        self.initialize().await
    }

    async fn acquire_credential(&self) -> CapabilityResult<AcquiredCredential> {
        if !self.is_ready() {
            return Err(CapabilityError::NotReady);
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(CapabilityError::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let outcome =
            match tokio::time::timeout(self.config.acquire_timeout, self.run_flow()).await {
                Ok(result) => result,
                Err(_) => Err(CapabilityError::Timeout),
            };

        if let Err(error) = &outcome {
            self.record_error(error.to_string());
            tracing::warn!(
                provider_id = %self.descriptor.id,
                error = %error,
                "Credential acquisition failed"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::GITHUB;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    struct HasFlowIdParam;

    impl Match for HasFlowIdParam {
        fn matches(&self, request: &Request) -> bool {
            request.url.query_pairs().any(|(key, _)| key == "flowId")
        }
    }

    static TEST_ENDPOINTS: FlowEndpoints = FlowEndpoints {
        probe_path: "flows/github/health",
        start_path: "flows/github/start",
        status_path: "flows/github/status",
    };

    fn fast_config() -> CapabilityConfig {
        CapabilityConfig {
            init_timeout: Duration::from_millis(200),
            init_poll_interval: Duration::from_millis(10),
            acquire_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn accepting_opener() -> AuthorizePageOpener {
        Arc::new(|_url: &str| true)
    }

    fn capability(server: &MockServer, opener: AuthorizePageOpener) -> RemoteFlowCapability {
        RemoteFlowCapability::new(&GITHUB, &TEST_ENDPOINTS, server.uri(), opener, fast_config())
            .unwrap()
    }

    async fn mount_probe_ok(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/flows/github/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    async fn mount_flow_start(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/flows/github/start"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"authorizeUrl":"https://github.com/login/oauth/authorize?state=x"}"#,
                "application/json",
            ))
            .mount(server)
            .await;
    }

    async fn mount_flow_status(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/flows/github/status"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                body.to_string(),
                "application/json",
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_initialize_retries_probe_until_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flows/github/health"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        mount_probe_ok(&server).await;

        let capability = capability(&server, accepting_opener());
        assert!(!capability.is_ready());

        capability.initialize().await.unwrap();
        assert!(capability.is_ready());
        assert!(capability.last_error().is_none());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flows/github/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let capability = capability(&server, accepting_opener());
        capability.initialize().await.unwrap();
        capability.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_fails_terminally_until_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flows/github/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let capability = capability(&server, accepting_opener());
        let err = capability.initialize().await.unwrap_err();
        assert!(matches!(err, CapabilityError::InitFailed(_)));
        assert!(!capability.is_ready());
        assert!(capability.last_error().is_some());

        // Still failed without another probe window.
        let err = capability.initialize().await.unwrap_err();
        assert!(matches!(err, CapabilityError::InitFailed(_)));

        // Flip the probe to healthy and retry.
        server.reset().await;
        mount_probe_ok(&server).await;
        capability.retry_init().await.unwrap();
        assert!(capability.is_ready());
    }

    #[tokio::test]
    async fn test_acquire_rejected_before_initialization() {
        let server = MockServer::start().await;
        let capability = capability(&server, accepting_opener());

        let err = capability.acquire_credential().await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotReady));
    }

    #[tokio::test]
    async fn test_acquire_completes_and_reports_identifier() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/flows/github/status"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":"pending"}"#,
                "application/json",
            ))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_flow_status(
            &server,
            r#"{"status":"complete","credential":{"token":"tok_gh","identifier":"octo@example.com"}}"#,
        )
        .await;

        let opened = Arc::new(AtomicUsize::new(0));
        let opener: AuthorizePageOpener = {
            let opened = opened.clone();
            Arc::new(move |url: &str| {
                assert!(url.starts_with("https://github.com/login"));
                opened.fetch_add(1, Ordering::SeqCst);
                true
            })
        };

        let capability = capability(&server, opener);
        capability.initialize().await.unwrap();

        let credential = capability.acquire_credential().await.unwrap();
        assert_eq!(credential.token, "tok_gh");
        assert_eq!(credential.identifier.as_deref(), Some("octo@example.com"));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert!(!capability.is_busy());
    }

    #[tokio::test]
    async fn test_acquire_polls_with_flow_id() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/flows/github/status"))
            .and(HasFlowIdParam)
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"status":"complete","credential":{"token":"tok"}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let capability = capability(&server, accepting_opener());
        capability.initialize().await.unwrap();
        capability.acquire_credential().await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_blocked_window() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;

        let opener: AuthorizePageOpener = Arc::new(|_url: &str| false);
        let capability = capability(&server, opener);
        capability.initialize().await.unwrap();

        let err = capability.acquire_credential().await.unwrap_err();
        assert!(matches!(err, CapabilityError::WindowBlocked));
        assert!(!capability.is_busy());
    }

    #[tokio::test]
    async fn test_acquire_cancelled_by_user() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        mount_flow_status(&server, r#"{"status":"cancelled"}"#).await;

        let capability = capability(&server, accepting_opener());
        capability.initialize().await.unwrap();

        let err = capability.acquire_credential().await.unwrap_err();
        assert!(matches!(err, CapabilityError::Cancelled));
    }

    #[tokio::test]
    async fn test_acquire_times_out_on_endless_pending() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        mount_flow_status(&server, r#"{"status":"pending"}"#).await;

        let capability = capability(&server, accepting_opener());
        capability.initialize().await.unwrap();

        let err = capability.acquire_credential().await.unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout));
        assert!(!capability.is_busy());
    }

    #[tokio::test]
    async fn test_second_acquire_rejected_while_busy_and_busy_resets_on_drop() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        mount_flow_status(&server, r#"{"status":"pending"}"#).await;

        let capability = Arc::new(capability(&server, accepting_opener()));
        capability.initialize().await.unwrap();

        let running = {
            let capability = capability.clone();
            tokio::spawn(async move { capability.acquire_credential().await })
        };
        // Let the first acquisition reach its poll loop.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(capability.is_busy());

        let err = capability.acquire_credential().await.unwrap_err();
        assert!(matches!(err, CapabilityError::Busy));

        // Dropping the in-flight acquisition releases the busy flag.
        running.abort();
        let _ = running.await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!capability.is_busy());
    }

    #[tokio::test]
    async fn test_flow_error_status_carries_service_message() {
        let server = MockServer::start().await;
        mount_probe_ok(&server).await;
        mount_flow_start(&server).await;
        mount_flow_status(
            &server,
            r#"{"status":"error","error":"provider revoked the request"}"#,
        )
        .await;

        let capability = capability(&server, accepting_opener());
        capability.initialize().await.unwrap();

        let err = capability.acquire_credential().await.unwrap_err();
        match err {
            CapabilityError::Flow(message) => {
                assert!(message.contains("provider revoked the request"));
            }
            other => panic!("expected Flow, got {other:?}"),
        }
        assert!(capability.last_error().is_some());
    }
}
