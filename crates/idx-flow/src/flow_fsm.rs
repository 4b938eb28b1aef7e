//! Login flow and logout state machines using rust-fsm.
//!
//! ## Login flow
//!
//! ```text
//! ┌──────────┐ LoginRequested ┌──────────┐ StepOffered ┌───────────────────┐
//! │   Idle   │ ─────────────► │ Starting │ ──────────► │ AwaitingStepInput │
//! └──────────┘                └────┬─────┘             └─────────┬─────────┘
//!                                  │ ProceedRequested            │ ProceedRequested
//!                                  ▼                             ▼
//!                             ┌────────────┐ ◄───────────────────┘
//!                             │ Proceeding │ ── StepOffered ──► AwaitingStepInput
//!                             └─────┬──────┘
//!                    Completed      │      Errored
//!                  ┌────────────────┴────────────────┐
//!                  ▼                                  ▼
//!             ┌─────────┐                        ┌────────┐
//!             │ Success │                        │ Failed │ (retry or restart)
//!             └─────────┘                        └────────┘
//! ```
//!
//! ## Logout
//!
//! `Idle -> Loading -> Success | Failed`, `Failed -> Loading` on retry and
//! `Success -> Idle` once the result has been acknowledged.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub flow_machine(Idle)

    Idle => {
        LoginRequested => Starting
    },
    Starting => {
        StepOffered => AwaitingStepInput,
        ProceedRequested => Proceeding,
        Completed => Success,
        Errored => Failed
    },
    AwaitingStepInput => {
        ProceedRequested => Proceeding,
        LoginRequested => Starting
    },
    Proceeding => {
        StepOffered => AwaitingStepInput,
        ProceedRequested => Proceeding,
        Completed => Success,
        Errored => Failed
    },
    Failed => {
        LoginRequested => Starting,
        ProceedRequested => Proceeding
    }
}

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub logout_machine(Idle)

    Idle => {
        LogoutRequested => Loading
    },
    Loading => {
        Revoked => Success,
        RevokeFailed => Failed
    },
    Failed => {
        LogoutRequested => Loading
    },
    Success => {
        Acknowledged => Idle
    }
}

pub use flow_machine::Input as FlowMachineInput;
pub use flow_machine::State as FlowMachineState;
pub use flow_machine::StateMachine as FlowMachine;

pub use logout_machine::Input as LogoutMachineInput;
pub use logout_machine::State as LogoutMachineState;
pub use logout_machine::StateMachine as LogoutMachine;

/// Login flow state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// No login attempted yet.
    Idle,
    /// Creating the client and resuming the interaction.
    Starting,
    /// A step is rendered and waits for the user.
    AwaitingStepInput,
    /// A step has been submitted.
    Proceeding,
    /// Tokens were issued.
    Success,
    /// The last attempt failed. Retry the pending step or start over.
    Failed,
}

impl FlowState {
    /// Returns true while a start or proceed call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, FlowState::Starting | FlowState::Proceeding)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Success)
    }
}

impl From<&FlowMachineState> for FlowState {
    fn from(state: &FlowMachineState) -> Self {
        match state {
            FlowMachineState::Idle => FlowState::Idle,
            FlowMachineState::Starting => FlowState::Starting,
            FlowMachineState::AwaitingStepInput => FlowState::AwaitingStepInput,
            FlowMachineState::Proceeding => FlowState::Proceeding,
            FlowMachineState::Success => FlowState::Success,
            FlowMachineState::Failed => FlowState::Failed,
        }
    }
}

/// Logout state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutState {
    Idle,
    Loading,
    Success,
    Failed,
}

impl From<&LogoutMachineState> for LogoutState {
    fn from(state: &LogoutMachineState) -> Self {
        match state {
            LogoutMachineState::Idle => LogoutState::Idle,
            LogoutMachineState::Loading => LogoutState::Loading,
            LogoutMachineState::Success => LogoutState::Success,
            LogoutMachineState::Failed => LogoutState::Failed,
        }
    }
}

/// Payload for flow state change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStateChangedPayload {
    /// Current flow state.
    pub state: FlowState,
    /// Type of the step awaiting input, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Display text of the last error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
