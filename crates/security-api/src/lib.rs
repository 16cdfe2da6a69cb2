//! Account security API client for the Terrace backend.
//!
//! This crate provides:
//! - Wire types for the account security endpoints
//! - The [`SecurityBackend`] trait the linking subsystem talks through
//! - An HTTP implementation over the Terrace REST API

mod backend;
mod error;
mod http;
mod types;

pub use backend::SecurityBackend;
pub use error::{BackendError, BackendResult};
pub use http::HttpSecurityBackend;
pub use types::{ProviderStatusEntry, SecurityStatusResponse};
