//! Account security status read model and store.
//!
//! This crate provides:
//! - The [`AccountSecurityStatus`] snapshot and its lockout-relevant helpers
//! - The [`SecurityStatusStore`], the single source of truth the linking
//!   engine reads and refreshes

mod status;
mod store;

pub use status::{AccountSecurityStatus, AuthMethod, LinkedProvider};
pub use store::{RefreshFailure, RefreshListener, SecurityStatusStore, StoreConfig};
