//! Per-provider operation state machine using rust-fsm.
//!
//! Each provider row owns one machine. The machine is the single source of
//! truth for whether an operation may start: a second link or unlink request
//! while one is running is an illegal transition and is rejected, never
//! queued.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial)
//! └───┬─────────┬───┘
//!     │         │
//!     │ LinkRequested          UnlinkRequested
//!     ▼         ▼
//! ┌─────────┐ ┌───────────┐
//! │ Linking │ │ Unlinking │
//! └───┬─────┘ └───┬───────┘
//!     │           │
//!     │ Succeeded ──► Idle      Succeeded / Failed ──► Idle
//!     │
//!     │ Failed
//!     ▼
//! ┌─────────────────┐
//! │     Errored     │ ── LinkRequested ──► Linking
//! └────────┬────────┘ ── UnlinkRequested ──► Unlinking
//!          │ Acknowledged
//!          ▼
//!         Idle
//! ```
//!
//! A failed unlink returns to `Idle` rather than `Errored`: unlink errors are
//! reported through the confirmation flow that requested them, so the
//! provider row itself has nothing to display.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

use crate::error::LinkingError;

// Generates a module `operation_machine` with:
// - operation_machine::State (enum)
// - operation_machine::Input (enum)
// - operation_machine::StateMachine (type alias)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub operation_machine(Idle)

    Idle => {
        LinkRequested => Linking,
        UnlinkRequested => Unlinking
    },
    Linking => {
        Succeeded => Idle,
        Failed => Errored
    },
    Unlinking => {
        Succeeded => Idle,
        Failed => Idle
    },
    Errored => {
        LinkRequested => Linking,
        UnlinkRequested => Unlinking,
        Acknowledged => Idle
    }
}

// Re-export the generated types with clearer names
pub use operation_machine::Input as OperationInput;
pub use operation_machine::State as OperationMachineState;
pub use operation_machine::StateMachine as OperationMachine;

/// Per-provider operation state as shown to UI surfaces.
///
/// This is the machine state plus the error message that accompanies the
/// `Errored` machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// No operation is running for this provider.
    Idle,
    /// A link flow is in progress.
    Linking,
    /// An unlink request is in progress.
    Unlinking,
    /// The last link attempt failed; carries the user-facing message.
    Error(String),
}

impl OperationState {
    /// Builds the public state from a machine state and the stored message.
    pub fn from_machine(state: &OperationMachineState, error_message: Option<&str>) -> Self {
        match state {
            OperationMachineState::Idle => OperationState::Idle,
            OperationMachineState::Linking => OperationState::Linking,
            OperationMachineState::Unlinking => OperationState::Unlinking,
            OperationMachineState::Errored => OperationState::Error(
                error_message
                    .map(str::to_string)
                    .unwrap_or_else(|| LinkingError::OperationFailed.to_string()),
            ),
        }
    }

    /// Returns true while a link or unlink is running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, OperationState::Linking | OperationState::Unlinking)
    }

    /// Returns true if the last operation failed and has not been dismissed.
    pub fn is_error(&self) -> bool {
        matches!(self, OperationState::Error(_))
    }
}
