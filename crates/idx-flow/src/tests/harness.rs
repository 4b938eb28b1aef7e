//! Test harness for flow controller tests.
//!
//! Provides:
//! - Script: queued responses plus a record of every call
//! - ScriptedFactory / ScriptedClient: an in-memory IDX client replaying a Script
//! - Response builders for the step shapes the flow handles

use crate::controller::FlowController;
use async_trait::async_trait;
use idx_remediation::{
    Authenticator, AuthenticatorCapability, AuthenticatorKind, Form, FormField, IdxClient,
    IdxClientConfig, IdxClientError, IdxClientFactory, IdxClientResult, Message, RemediationStep,
    Response, StepType, TokenBundle, TotpCapability,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Queued results and recorded calls.
#[derive(Default)]
pub struct Script {
    start_error: Mutex<Option<IdxClientError>>,
    resumes: Mutex<VecDeque<IdxClientResult<Response>>>,
    proceeds: Mutex<VecDeque<IdxClientResult<Response>>>,
    exchanges: Mutex<VecDeque<IdxClientResult<TokenBundle>>>,
    starts: Mutex<usize>,
    proceeded: Mutex<Vec<RemediationStep>>,
    exchanged: Mutex<Vec<RemediationStep>>,
}

impl Script {
    pub fn fail_start(&self, error: IdxClientError) {
        *self.start_error.lock() = Some(error);
    }

    pub fn on_resume(&self, result: IdxClientResult<Response>) {
        self.resumes.lock().push_back(result);
    }

    pub fn on_proceed(&self, result: IdxClientResult<Response>) {
        self.proceeds.lock().push_back(result);
    }

    pub fn on_exchange(&self, result: IdxClientResult<TokenBundle>) {
        self.exchanges.lock().push_back(result);
    }

    pub fn starts(&self) -> usize {
        *self.starts.lock()
    }

    /// Steps passed to `proceed`, in call order.
    pub fn proceeded(&self) -> Vec<RemediationStep> {
        self.proceeded.lock().clone()
    }

    pub fn exchanged(&self) -> Vec<RemediationStep> {
        self.exchanged.lock().clone()
    }
}

fn exhausted<T>(call: &str) -> IdxClientResult<T> {
    Err(IdxClientError::Server(format!("no scripted {} result", call)))
}

pub struct ScriptedFactory {
    script: Arc<Script>,
}

pub struct ScriptedClient {
    script: Arc<Script>,
}

#[async_trait]
impl IdxClientFactory for ScriptedFactory {
    type Client = ScriptedClient;

    async fn start(&self, _config: &IdxClientConfig) -> IdxClientResult<ScriptedClient> {
        *self.script.starts.lock() += 1;
        if let Some(error) = self.script.start_error.lock().take() {
            return Err(error);
        }
        Ok(ScriptedClient {
            script: Arc::clone(&self.script),
        })
    }
}

#[async_trait]
impl IdxClient for ScriptedClient {
    async fn resume(&self) -> IdxClientResult<Response> {
        let next = self.script.resumes.lock().pop_front();
        next.unwrap_or_else(|| exhausted("resume"))
    }

    async fn proceed(&self, step: &RemediationStep) -> IdxClientResult<Response> {
        self.script.proceeded.lock().push(step.clone());
        let next = self.script.proceeds.lock().pop_front();
        next.unwrap_or_else(|| exhausted("proceed"))
    }

    async fn exchange_for_tokens(&self, issue: &RemediationStep) -> IdxClientResult<TokenBundle> {
        self.script.exchanged.lock().push(issue.clone());
        let next = self.script.exchanges.lock().pop_front();
        next.unwrap_or_else(|| exhausted("exchange"))
    }
}

/// Owns a script and builds controllers over it.
pub struct TestHarness {
    pub script: Arc<Script>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::default()),
        }
    }

    pub fn controller(&self) -> FlowController<ScriptedFactory> {
        FlowController::new(
            ScriptedFactory {
                script: Arc::clone(&self.script),
            },
            client_config(),
        )
    }
}

pub fn client_config() -> IdxClientConfig {
    IdxClientConfig {
        issuer: Url::parse("https://login.example.com/oauth2/default").unwrap(),
        client_id: "test-client".to_string(),
        scopes: vec!["openid".to_string(), "profile".to_string()],
        redirect_uri: "com.example.idx:/callback".to_string(),
    }
}

pub fn response(steps: Vec<RemediationStep>) -> Response {
    Response {
        is_login_successful: false,
        messages: Vec::new(),
        remediations: steps,
    }
}

pub fn message_response(text: &str, steps: Vec<RemediationStep>) -> Response {
    Response {
        messages: vec![Message::error(text)],
        ..response(steps)
    }
}

pub fn success_response() -> Response {
    Response {
        is_login_successful: true,
        messages: Vec::new(),
        remediations: vec![RemediationStep::new(StepType::Issue, Vec::new())],
    }
}

pub fn tokens() -> TokenBundle {
    TokenBundle {
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        access_token: "access-1".to_string(),
        scope: Some("openid profile".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        id_token: Some("id-1".to_string()),
    }
}

fn nested(name: &str, fields: Vec<FormField>) -> FormField {
    let mut field = FormField::text(name, name);
    field.form = Some(Form::new(fields));
    field
}

fn passcode(label: &str) -> FormField {
    let mut field = FormField::text("passcode", label);
    field.required = true;
    field.secret = true;
    field
}

fn authenticator(kind: AuthenticatorKind) -> Authenticator {
    Authenticator {
        id: format!("aut-{:?}", kind).to_lowercase(),
        display_name: None,
        kind,
        key: None,
        capabilities: Vec::new(),
    }
}

pub fn identify_step() -> RemediationStep {
    let mut identifier = FormField::text("identifier", "Username");
    identifier.required = true;
    RemediationStep::new(
        StepType::Identify,
        vec![identifier, nested("credentials", vec![passcode("Password")])],
    )
}

/// Challenge with a single authenticator of `kind`; `None` for no authenticator.
pub fn challenge_step(kind: Option<AuthenticatorKind>) -> RemediationStep {
    let mut step = RemediationStep::new(
        StepType::ChallengeAuthenticator,
        vec![nested("credentials", vec![passcode("Code")])],
    );
    step.authenticators.extend(kind.map(authenticator));
    step
}

pub fn select_enroll_step() -> RemediationStep {
    let mut email = nested("authenticator", vec![FormField::text("id", "Id")]);
    email.label = Some("Email".to_string());
    let mut phone_number = FormField::text("phoneNumber", "Phone number");
    phone_number.required = true;
    let mut phone = nested("authenticator", vec![FormField::text("id", "Id"), phone_number]);
    phone.label = Some("Phone".to_string());

    let mut group = FormField::text("authenticator", "Authenticator");
    group.required = true;
    group.options = Some(vec![email, phone]);
    RemediationStep::new(StepType::SelectAuthenticatorEnroll, vec![group])
}

pub fn enroll_totp_step() -> RemediationStep {
    let mut step = RemediationStep::new(
        StepType::EnrollAuthenticator,
        vec![nested("credentials", vec![passcode("Enter code")])],
    );
    let mut app = authenticator(AuthenticatorKind::App);
    app.key = Some("google_otp".to_string());
    app.capabilities.push(AuthenticatorCapability::Totp(TotpCapability {
        image_data: PNG_DATA_URI.to_string(),
        shared_secret: Some("JBSWY3DPEHPK3PXP".to_string()),
    }));
    step.authenticators.push(app);
    step
}

pub fn skip_step() -> RemediationStep {
    RemediationStep::new(StepType::Skip, Vec::new())
}
