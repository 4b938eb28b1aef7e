//! Server-described remediation model.
//!
//! These types mirror what the IDX client hands back after `resume` or
//! `proceed`. The flow owns them only for the lifetime of one response:
//! field values and option selections are written into them before the step
//! is sent back to the client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Field type the mapper renders as a text input.
pub const STRING_FIELD_TYPE: &str = "string";

/// Remediation step types offered by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    Identify,
    IdentifyRecovery,
    SelectIdentify,
    SelectEnrollProfile,
    EnrollProfile,
    ChallengeAuthenticator,
    SelectAuthenticatorAuthenticate,
    SelectAuthenticatorEnroll,
    EnrollAuthenticator,
    AuthenticatorVerificationData,
    AuthenticatorEnrollmentData,
    SelectEnrollmentChannel,
    EnrollmentChannelData,
    EnrollPoll,
    ChallengePoll,
    Recover,
    ResetAuthenticator,
    RedirectIdp,
    LaunchAuthenticator,
    UnlockAccount,
    Skip,
    Cancel,
    Issue,
    #[serde(other)]
    Unknown,
}

impl StepType {
    /// Wire name of the step type.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Identify => "identify",
            StepType::IdentifyRecovery => "identify-recovery",
            StepType::SelectIdentify => "select-identify",
            StepType::SelectEnrollProfile => "select-enroll-profile",
            StepType::EnrollProfile => "enroll-profile",
            StepType::ChallengeAuthenticator => "challenge-authenticator",
            StepType::SelectAuthenticatorAuthenticate => "select-authenticator-authenticate",
            StepType::SelectAuthenticatorEnroll => "select-authenticator-enroll",
            StepType::EnrollAuthenticator => "enroll-authenticator",
            StepType::AuthenticatorVerificationData => "authenticator-verification-data",
            StepType::AuthenticatorEnrollmentData => "authenticator-enrollment-data",
            StepType::SelectEnrollmentChannel => "select-enrollment-channel",
            StepType::EnrollmentChannelData => "enrollment-channel-data",
            StepType::EnrollPoll => "enroll-poll",
            StepType::ChallengePoll => "challenge-poll",
            StepType::Recover => "recover",
            StepType::ResetAuthenticator => "reset-authenticator",
            StepType::RedirectIdp => "redirect-idp",
            StepType::LaunchAuthenticator => "launch-authenticator",
            StepType::UnlockAccount => "unlock-account",
            StepType::Skip => "skip",
            StepType::Cancel => "cancel",
            StepType::Issue => "issue",
            StepType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a server-supplied message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    #[default]
    Error,
    Info,
    #[serde(other)]
    Unknown,
}

/// A message attached to a response, a step or a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    #[serde(default)]
    pub severity: MessageSeverity,
}

impl Message {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: MessageSeverity::Error,
        }
    }
}

/// Ordered collection of form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    /// Visible fields with their index in `fields`, in server order.
    pub fn visible_fields(&self) -> impl Iterator<Item = (usize, &FormField)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.visible)
    }

    pub fn has_visible_fields(&self) -> bool {
        self.fields.iter().any(|field| field.visible)
    }

    /// Find a field by dotted name (`credentials.passcode`), descending
    /// through nested forms.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut field = self.fields.iter().find(|f| f.name == first)?;
        for segment in segments {
            field = field.form.as_ref()?.fields.iter().find(|f| f.name == segment)?;
        }
        Some(field)
    }

    /// Mutable variant of [`Form::field`].
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut field = self.fields.iter_mut().find(|f| f.name == first)?;
        for segment in segments {
            field = field
                .form
                .as_mut()?
                .fields
                .iter_mut()
                .find(|f| f.name == segment)?;
        }
        Some(field)
    }
}

fn default_field_type() -> String {
    STRING_FIELD_TYPE.to_string()
}

fn default_true() -> bool {
    true
}

/// A single field of a remediation form.
///
/// A field either carries a value, nests another form, or offers options
/// (each option is itself a field, usually with a label and a nested form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub secret: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub mutable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FormField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl FormField {
    /// A visible, mutable string field.
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
            field_type: default_field_type(),
            value: None,
            required: false,
            secret: false,
            visible: true,
            mutable: true,
            form: None,
            options: None,
            selected_option: None,
            messages: Vec::new(),
        }
    }

    /// The current value when it is a JSON string.
    pub fn string_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    pub fn set_string_value(&mut self, value: impl Into<String>) {
        self.value = Some(Value::String(value.into()));
    }

    /// True when the field nests a form with at least one visible field.
    pub fn has_visible_nested_fields(&self) -> bool {
        self.form.as_ref().is_some_and(Form::has_visible_fields)
    }

    /// Options offered by this field, empty when it has none.
    pub fn option_list(&self) -> &[FormField] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Field messages joined by newlines, or `None` when there are none.
    pub fn display_messages(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        Some(
            self.messages
                .iter()
                .map(|m| m.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Authenticator categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticatorKind {
    Password,
    App,
    Email,
    Phone,
    SecurityQuestion,
    SecurityKey,
    Device,
    Federated,
    #[serde(other)]
    Unknown,
}

/// TOTP enrollment data: a QR code image and optionally the raw secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpCapability {
    /// `data:image/png;base64,...` URI of the QR code.
    pub image_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

impl TotpCapability {
    /// Decode the QR code image. `None` when the URI is not a base64 image
    /// or decodes to nothing.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        let (header, payload) = self.image_data.split_once(',')?;
        if !header.starts_with("data:image/") || !header.ends_with(";base64") {
            return None;
        }
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        (!bytes.is_empty()).then_some(bytes)
    }
}

/// Behaviour attached to an authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticatorCapability {
    Totp(TotpCapability),
    Send,
    Resend,
    Recover,
    #[serde(other)]
    Other,
}

/// An authenticator associated with a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: AuthenticatorKind,
    /// Provider key, e.g. `google_otp` or `okta_email`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<AuthenticatorCapability>,
}

impl Authenticator {
    pub fn totp(&self) -> Option<&TotpCapability> {
        self.capabilities.iter().find_map(|capability| match capability {
            AuthenticatorCapability::Totp(totp) => Some(totp),
            _ => None,
        })
    }
}

/// Behaviour attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepCapability {
    /// The step is awaited (polled), not submitted.
    Poll {
        #[serde(default)]
        wait_ms: u64,
    },
    #[serde(other)]
    Other,
}

/// One server-described unit of work in the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub form: Form,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authenticators: Vec<Authenticator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<StepCapability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl RemediationStep {
    pub fn new(step_type: StepType, fields: Vec<FormField>) -> Self {
        Self {
            step_type,
            name: step_type.as_str().to_string(),
            form: Form::new(fields),
            authenticators: Vec::new(),
            capabilities: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Find a field by dotted name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.form.field(name)
    }

    /// Find a field by dotted name for writing.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.form.field_mut(name)
    }

    pub fn is_pollable(&self) -> bool {
        self.capabilities
            .iter()
            .any(|capability| matches!(capability, StepCapability::Poll { .. }))
    }

    /// First authenticator exposing a TOTP capability.
    pub fn totp_authenticator(&self) -> Option<(&Authenticator, &TotpCapability)> {
        self.authenticators
            .iter()
            .find_map(|authenticator| authenticator.totp().map(|totp| (authenticator, totp)))
    }
}

/// A response from `resume` or `proceed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub is_login_successful: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub remediations: Vec<RemediationStep>,
}

impl Response {
    /// First step of the given type.
    pub fn remediation(&self, step_type: StepType) -> Option<&RemediationStep> {
        self.remediations
            .iter()
            .find(|step| step.step_type == step_type)
    }

    /// Index of the first step of the given type.
    pub fn remediation_index(&self, step_type: StepType) -> Option<usize> {
        self.remediations
            .iter()
            .position(|step| step.step_type == step_type)
    }
}

/// Tokens returned by the interaction code exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub token_type: String,
    pub expires_in: i64,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("has_id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}
