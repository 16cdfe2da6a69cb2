//! Sign-in provider capabilities for account linking.
//!
//! This crate provides:
//! - The static provider catalog
//! - The [`ProviderCapability`] trait the linking engine drives
//! - A shared remote-flow engine and the built-in provider adapters
//! - The [`CapabilityTable`] used to look capabilities up by provider id

mod adapters;
mod capability;
mod descriptor;
mod error;
mod flow;
mod table;

pub use adapters::{github, google, microsoft};
pub use capability::{
    AcquiredCredential, AuthorizePageOpener, CapabilityConfig, ProviderCapability,
};
pub use descriptor::{
    descriptor_by_id, FlowEndpoints, ProviderDescriptor, BUILTIN_PROVIDERS, GITHUB, GOOGLE,
    MICROSOFT,
};
pub use error::{CapabilityError, CapabilityResult};
pub use flow::RemoteFlowCapability;
pub use table::CapabilityTable;
