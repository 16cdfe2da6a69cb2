//! Built-in provider adapters.
//!
//! Each adapter is a one-line constructor over the shared flow engine; only
//! the descriptor and the flow service paths differ per provider.

use crate::capability::{AuthorizePageOpener, CapabilityConfig};
use crate::descriptor::{FlowEndpoints, GITHUB, GOOGLE, MICROSOFT};
use crate::error::CapabilityResult;
use crate::flow::RemoteFlowCapability;

static GOOGLE_ENDPOINTS: FlowEndpoints = FlowEndpoints {
    probe_path: "flows/google/health",
    start_path: "flows/google/start",
    status_path: "flows/google/status",
};

static GITHUB_ENDPOINTS: FlowEndpoints = FlowEndpoints {
    probe_path: "flows/github/health",
    start_path: "flows/github/start",
    status_path: "flows/github/status",
};

static MICROSOFT_ENDPOINTS: FlowEndpoints = FlowEndpoints {
    probe_path: "flows/microsoft/health",
    start_path: "flows/microsoft/start",
    status_path: "flows/microsoft/status",
};

/// Google sign-in over the flow service.
pub fn google(
    service_url: &str,
    opener: AuthorizePageOpener,
    config: CapabilityConfig,
) -> CapabilityResult<RemoteFlowCapability> {
    RemoteFlowCapability::new(&GOOGLE, &GOOGLE_ENDPOINTS, service_url, opener, config)
}

/// GitHub sign-in over the flow service.
pub fn github(
    service_url: &str,
    opener: AuthorizePageOpener,
    config: CapabilityConfig,
) -> CapabilityResult<RemoteFlowCapability> {
    RemoteFlowCapability::new(&GITHUB, &GITHUB_ENDPOINTS, service_url, opener, config)
}

/// Microsoft sign-in over the flow service.
pub fn microsoft(
    service_url: &str,
    opener: AuthorizePageOpener,
    config: CapabilityConfig,
) -> CapabilityResult<RemoteFlowCapability> {
    RemoteFlowCapability::new(&MICROSOFT, &MICROSOFT_ENDPOINTS, service_url, opener, config)
}
