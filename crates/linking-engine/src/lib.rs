//! Coordination layer for linking and unlinking account sign-in methods.
//!
//! The [`LinkingCoordinator`] sits between the UI surface and the rest of the
//! stack: it owns a per-provider operation state machine, an optimistic
//! overlay for in-flight links, and the lockout check that refuses to remove
//! an account's last remaining sign-in method. Provider flows come from
//! `provider-capability`, authoritative status from `security-status`, and
//! backend writes go through `security-api`.

mod config;
mod coordinator;
mod error;
mod logging;
mod machine;
mod overlay;
mod reauth;

pub use config::LinkingConfig;
pub use coordinator::{
    LinkErrorCallback, LinkSuccessCallback, LinkingCallbacks, LinkingCoordinator,
};
pub use error::{LinkingError, LinkingResult};
pub use logging::{init_logging, parse_level};
pub use machine::{OperationInput, OperationMachine, OperationMachineState, OperationState};
pub use overlay::{OptimisticOverlay, PENDING_IDENTIFIER};
pub use reauth::{ReauthFlow, ReauthPhase};
