//! IDX login flow.
//!
//! This crate provides:
//! - `FlowController`: drives a login through server-described steps
//! - `LoginFormState`: username/password validation before a flow starts
//! - `SessionManager`: user claims and logout by token revocation
//! - Explicit FSM-based flow and logout state

mod config;
mod controller;
mod error;
mod flow_fsm;
mod login_form;
mod session;

#[cfg(test)]
mod tests;

pub use config::client_config;
pub use controller::{FlowController, FlowFailure, FlowOutcome, FlowStateCallback, LoggedInUser};
pub use error::{ErrorCode, FlowError, FlowResult};
pub use flow_fsm::{flow_machine, logout_machine};
pub use flow_fsm::{
    FlowMachine, FlowMachineInput, FlowMachineState, FlowState, FlowStateChangedPayload,
    LogoutMachine, LogoutMachineInput, LogoutMachineState, LogoutState,
};
pub use login_form::{is_password_valid, is_username_valid, LoginFieldError, LoginFormState};
pub use session::{claim_text, Claims, SessionManager, TokenTypeHint};
