//! Login flow controller.
//!
//! Drives one interaction from `login` to token issuance. Each server
//! response is classified: identify and password challenges are answered
//! with the stored credentials and proceeded automatically, supported steps
//! are mapped into descriptors for the rendering layer, and everything else
//! fails the flow. The loop never recurses; every proceed replaces the
//! response being examined.

use crate::error::{ErrorCode, FlowError, FlowResult};
use crate::flow_fsm::{FlowMachine, FlowMachineInput, FlowState, FlowStateChangedPayload};
use idx_remediation::{
    find_by_handle_mut, validate_all, ActionTarget, AuthenticatorKind, DescriptorError,
    FieldDescriptor, FieldHandle, IdxClient, IdxClientConfig, IdxClientFactory, RemediationMapper,
    RemediationStep, Response, StepType, TokenBundle,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

const IDENTIFIER_FIELD: &str = "identifier";
const PASSCODE_FIELD: &str = "credentials.passcode";

/// Callback type for flow state change notifications.
pub type FlowStateCallback = Box<dyn Fn(FlowStateChangedPayload) + Send + Sync>;

/// An authenticated user: the tokens from the code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedInUser {
    pub tokens: TokenBundle,
}

/// Result of a successful `login` or `invoke` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Tokens were issued.
    LoggedIn(LoggedInUser),
    /// A step of this type is rendered in [`FlowController::fields`].
    StepRequired(StepType),
}

/// Snapshot of the last flow error for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
    pub fatal: bool,
}

impl From<&FlowError> for FlowFailure {
    fn from(error: &FlowError) -> Self {
        Self {
            code: error.code(),
            message: error.display_message(),
            fatal: error.is_fatal(),
        }
    }
}

struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// The response currently rendered, and its descriptors.
#[derive(Debug)]
struct PendingStep {
    response: Response,
    step_index: usize,
    fields: Vec<FieldDescriptor>,
}

impl PendingStep {
    fn step(&self) -> Option<&RemediationStep> {
        self.response.remediations.get(self.step_index)
    }
}

/// Drives a login through the server-described remediation steps.
pub struct FlowController<F: IdxClientFactory> {
    factory: F,
    config: IdxClientConfig,
    mapper: RemediationMapper,
    client: Option<F::Client>,
    credentials: Option<Credentials>,
    pending: Option<PendingStep>,
    last_error: Option<FlowFailure>,
    fsm: FlowMachine,
    state_callback: Option<FlowStateCallback>,
}

impl<F: IdxClientFactory> FlowController<F> {
    pub fn new(factory: F, config: IdxClientConfig) -> Self {
        Self {
            factory,
            config,
            mapper: RemediationMapper::new(),
            client: None,
            credentials: None,
            pending: None,
            last_error: None,
            fsm: FlowMachine::new(),
            state_callback: None,
        }
    }

    /// Set a callback to be notified of flow state changes.
    pub fn set_state_callback(&mut self, callback: FlowStateCallback) {
        self.state_callback = Some(callback);
    }

    /// Get the current flow state.
    pub fn state(&self) -> FlowState {
        FlowState::from(self.fsm.state())
    }

    /// Descriptors of the step awaiting input, empty when there is none.
    pub fn fields(&self) -> &[FieldDescriptor] {
        self.pending
            .as_ref()
            .map(|pending| pending.fields.as_slice())
            .unwrap_or_default()
    }

    /// The step awaiting input, with every value written so far.
    pub fn pending_step(&self) -> Option<&RemediationStep> {
        self.pending.as_ref().and_then(PendingStep::step)
    }

    pub fn last_error(&self) -> Option<&FlowFailure> {
        self.last_error.as_ref()
    }

    /// Start a new interaction with `username` and `password`.
    ///
    /// Allowed from `Idle`, `Failed` and `AwaitingStepInput` (restart).
    pub async fn login(&mut self, username: &str, password: &str) -> FlowResult<FlowOutcome> {
        self.transition(&FlowMachineInput::LoginRequested)?;
        info!(username = %username, "Starting login flow");

        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self.client = None;
        self.pending = None;
        self.last_error = None;

        let client = match self.factory.start(&self.config).await {
            Ok(client) => client,
            Err(e) => return self.fail(FlowError::ClientCreation(e)),
        };
        let resumed = client.resume().await;
        self.client = Some(client);

        match resumed {
            Ok(response) => self.handle_response(response).await,
            Err(e) => self.fail(FlowError::Resume(e)),
        }
    }

    /// Proceed with the pending step named by an action descriptor.
    ///
    /// Allowed from `AwaitingStepInput`, and from `Failed` when a step was
    /// retained for retry.
    pub async fn invoke(&mut self, target: ActionTarget) -> FlowResult<FlowOutcome> {
        let state = self.state();
        if !matches!(state, FlowState::AwaitingStepInput | FlowState::Failed) {
            return Err(FlowError::InvalidStateTransition(format!(
                "Cannot proceed in state {:?}",
                state
            )));
        }
        let Some(pending) = self.pending.as_ref() else {
            return Err(FlowError::InvalidStateTransition(
                "No step awaiting input".to_string(),
            ));
        };
        let step = match pending.response.remediations.get(target.step) {
            Some(step) if step.step_type == target.step_type => step.clone(),
            _ => {
                return Err(FlowError::InvalidStateTransition(format!(
                    "Action target {} at {} is not part of the pending response",
                    target.step_type, target.step
                )))
            }
        };

        debug!(step = %step.step_type, "Proceeding with selected step");
        match self.proceed_with(&step).await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => self.fail(e),
        }
    }

    /// Write a text value into the pending step.
    pub fn update_text(&mut self, handle: &FieldHandle, value: &str) -> FlowResult<()> {
        let PendingStep {
            response, fields, ..
        } = self.pending_mut()?;
        let step = step_for_handle(response, handle)?;
        match find_by_handle_mut(fields, handle) {
            Some(FieldDescriptor::Text(text)) => Ok(text.set_value(value, step)?),
            _ => Err(unresolved(handle)),
        }
    }

    /// Record an option selection (or clear it) on the pending step.
    pub fn select_option(&mut self, handle: &FieldHandle, option: Option<usize>) -> FlowResult<()> {
        let PendingStep {
            response, fields, ..
        } = self.pending_mut()?;
        let step = step_for_handle(response, handle)?;
        match find_by_handle_mut(fields, handle) {
            Some(FieldDescriptor::Options(group)) => Ok(group.select(option, step)?),
            _ => Err(unresolved(handle)),
        }
    }

    /// Required-field validation over the pending descriptors. Sets inline
    /// messages; returns false when nothing is pending.
    pub fn validate_fields(&mut self) -> bool {
        match self.pending.as_mut() {
            Some(pending) => validate_all(&mut pending.fields),
            None => false,
        }
    }

    fn pending_mut(&mut self) -> FlowResult<&mut PendingStep> {
        self.pending.as_mut().ok_or_else(|| {
            FlowError::InvalidStateTransition("No step awaiting input".to_string())
        })
    }

    async fn handle_response(&mut self, mut response: Response) -> FlowResult<FlowOutcome> {
        loop {
            if response.is_login_successful {
                return self.complete(&response).await;
            }

            if let Some(message) = response.messages.first() {
                let message = message.message.clone();
                return self.fail(FlowError::ServerMessage(message));
            }

            let Some(first) = response.remediations.first_mut() else {
                return self.fail(FlowError::NoRemediation);
            };

            let step_type = first.step_type;
            match step_type {
                StepType::Identify => {
                    self.autofill(first, &[IDENTIFIER_FIELD, PASSCODE_FIELD]);
                }
                StepType::ChallengeAuthenticator => {
                    match first.authenticators.first().map(|a| a.kind) {
                        Some(AuthenticatorKind::Password) => {
                            self.autofill(first, &[PASSCODE_FIELD]);
                        }
                        Some(AuthenticatorKind::App) | Some(AuthenticatorKind::Email) => {
                            return self.offer_step(response, 0, false);
                        }
                        other => return self.fail(FlowError::UnsupportedAuthenticator(other)),
                    }
                }
                StepType::SelectAuthenticatorEnroll
                | StepType::SelectAuthenticatorAuthenticate
                | StepType::EnrollAuthenticator => {
                    return self.offer_step(response, 0, true);
                }
                other => return self.fail(FlowError::UnsupportedRemediation(other)),
            }

            // The server has moved past any rendered step.
            self.pending = None;
            match self.proceed_with(&response.remediations[0]).await {
                Ok(next) => response = next,
                Err(e) => return self.fail(e),
            }
        }
    }

    /// Copy stored credentials into the named fields. Missing fields are
    /// skipped; the server reports what it still needs.
    fn autofill(&self, step: &mut RemediationStep, names: &[&str]) {
        let Some(credentials) = self.credentials.as_ref() else {
            warn!(step = %step.step_type, "No stored credentials to fill");
            return;
        };
        for name in names {
            let value = if *name == IDENTIFIER_FIELD {
                &credentials.username
            } else {
                &credentials.password
            };
            match step.field_mut(name) {
                Some(field) => field.set_string_value(value.as_str()),
                None => debug!(step = %step.step_type, field = %name, "Field not offered"),
            }
        }
    }

    async fn proceed_with(&mut self, step: &RemediationStep) -> FlowResult<Response> {
        self.transition(&FlowMachineInput::ProceedRequested)?;
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| FlowError::Unknown("No active client".to_string()))?;
        debug!(step = %step.step_type, "Proceeding");
        client.proceed(step).await.map_err(FlowError::Proceed)
    }

    fn offer_step(
        &mut self,
        response: Response,
        step_index: usize,
        include_skip: bool,
    ) -> FlowResult<FlowOutcome> {
        let fields = self.mapper.map_step(&response, step_index, include_skip);
        let step_type = response.remediations[step_index].step_type;
        self.pending = Some(PendingStep {
            response,
            step_index,
            fields,
        });
        self.last_error = None;
        self.transition(&FlowMachineInput::StepOffered)?;
        info!(step = %step_type, "Awaiting step input");
        Ok(FlowOutcome::StepRequired(step_type))
    }

    async fn complete(&mut self, response: &Response) -> FlowResult<FlowOutcome> {
        let Some(issue) = response.remediation(StepType::Issue) else {
            return self.fail(FlowError::Unknown(
                "Login succeeded without an issue step".to_string(),
            ));
        };
        let Some(client) = self.client.as_ref() else {
            return self.fail(FlowError::Unknown("No active client".to_string()));
        };

        let exchanged = client.exchange_for_tokens(issue).await;
        match exchanged {
            Ok(tokens) => {
                self.credentials = None;
                self.pending = None;
                self.last_error = None;
                self.transition(&FlowMachineInput::Completed)?;
                info!(token_type = %tokens.token_type, "Login flow completed");
                Ok(FlowOutcome::LoggedIn(LoggedInUser { tokens }))
            }
            Err(e) => self.fail(FlowError::Exchange(e)),
        }
    }

    /// Record `error`, enter `Failed` and return it. Fatal errors drop the
    /// credentials and the pending step; others keep the step for retry.
    fn fail<T>(&mut self, error: FlowError) -> FlowResult<T> {
        warn!(error = %error, fatal = error.is_fatal(), "Login flow failed");
        if error.is_fatal() {
            self.credentials = None;
            self.pending = None;
        }
        self.last_error = Some(FlowFailure::from(&error));
        if let Err(e) = self.transition(&FlowMachineInput::Errored) {
            warn!(error = %e, "Could not record flow failure");
        }
        Err(error)
    }

    /// Transition the FSM and notify callback if state changed.
    fn transition(&mut self, input: &FlowMachineInput) -> FlowResult<FlowState> {
        let old_state = self.state();

        self.fsm.consume(input).map_err(|_| {
            FlowError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input, old_state
            ))
        })?;

        let new_state = self.state();
        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Flow state transition"
            );
            self.notify_state_change(new_state);
        }

        Ok(new_state)
    }

    fn notify_state_change(&self, state: FlowState) {
        if let Some(callback) = self.state_callback.as_ref() {
            let step = match state {
                FlowState::AwaitingStepInput => self
                    .pending_step()
                    .map(|step| step.step_type.as_str().to_string()),
                _ => None,
            };
            callback(FlowStateChangedPayload {
                state,
                step,
                error: self.last_error.as_ref().map(|e| e.message.clone()),
            });
        }
    }
}

fn step_for_handle<'a>(
    response: &'a mut Response,
    handle: &FieldHandle,
) -> FlowResult<&'a mut RemediationStep> {
    response
        .remediations
        .get_mut(handle.step)
        .ok_or_else(|| unresolved(handle))
}

fn unresolved(handle: &FieldHandle) -> FlowError {
    FlowError::Field(DescriptorError::UnresolvedField {
        step: handle.step,
        path: handle.path.clone(),
    })
}
