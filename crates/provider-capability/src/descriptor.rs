//! Static provider catalog.
//!
//! Descriptors and flow endpoints are compile-time constants; nothing here is
//! created or destroyed at runtime. Adding a provider means adding a
//! descriptor, an endpoints entry, and a one-line adapter constructor.

/// Immutable description of a sign-in provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Stable provider id used on the wire and as the lookup key
    pub id: &'static str,
    /// Human-readable name for UI surfaces
    pub display_name: &'static str,
}

/// Flow service paths for one provider.
pub struct FlowEndpoints {
    /// Readiness probe, polled during initialization
    pub probe_path: &'static str,
    /// Starts a sign-in flow
    pub start_path: &'static str,
    /// Reports the status of a running flow
    pub status_path: &'static str,
}

pub const GOOGLE: ProviderDescriptor = ProviderDescriptor {
    id: "google",
    display_name: "Google",
};

pub const GITHUB: ProviderDescriptor = ProviderDescriptor {
    id: "github",
    display_name: "GitHub",
};

pub const MICROSOFT: ProviderDescriptor = ProviderDescriptor {
    id: "microsoft",
    display_name: "Microsoft",
};

/// Providers shipped with the subsystem.
pub const BUILTIN_PROVIDERS: &[ProviderDescriptor] = &[GOOGLE, GITHUB, MICROSOFT];

/// Look a built-in descriptor up by its id.
pub fn descriptor_by_id(id: &str) -> Option<&'static ProviderDescriptor> {
    BUILTIN_PROVIDERS.iter().find(|descriptor| descriptor.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup_by_id() {
        let descriptor = descriptor_by_id("github").unwrap();
        assert_eq!(descriptor.display_name, "GitHub");
    }

    #[test]
    fn test_descriptor_lookup_unknown_id() {
        assert!(descriptor_by_id("myspace").is_none());
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let mut ids: Vec<_> = BUILTIN_PROVIDERS.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), BUILTIN_PROVIDERS.len());
    }
}
