//! Capability lookup, keyed by provider id.

use crate::adapters;
use crate::capability::{AuthorizePageOpener, CapabilityConfig, ProviderCapability};
use crate::error::CapabilityResult;
use std::collections::HashMap;
use std::sync::Arc;

/// The set of capabilities available to the linking engine.
///
/// Production registers the built-in adapters; tests insert fakes through
/// the same trait.
pub struct CapabilityTable {
    by_id: HashMap<&'static str, Arc<dyn ProviderCapability>>,
}

impl CapabilityTable {
    /// Empty table; callers register capabilities via [`insert`](Self::insert).
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
        }
    }

    /// Table with the built-in Google, GitHub, and Microsoft adapters.
    pub fn builtin(
        service_url: &str,
        opener: AuthorizePageOpener,
        config: CapabilityConfig,
    ) -> CapabilityResult<Self> {
        let mut table = Self::new();
        table.insert(Arc::new(adapters::google(
            service_url,
            opener.clone(),
            config.clone(),
        )?));
        table.insert(Arc::new(adapters::github(
            service_url,
            opener.clone(),
            config.clone(),
        )?));
        table.insert(Arc::new(adapters::microsoft(service_url, opener, config)?));
        Ok(table)
    }

    /// Register a capability under its descriptor id.
    pub fn insert(&mut self, capability: Arc<dyn ProviderCapability>) {
        self.by_id.insert(capability.descriptor().id, capability);
    }

    /// Look a capability up by provider id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn ProviderCapability>> {
        self.by_id.get(provider_id).cloned()
    }

    /// Registered provider ids.
    pub fn ids(&self) -> Vec<&'static str> {
        self.by_id.keys().copied().collect()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::new()
    }
}
