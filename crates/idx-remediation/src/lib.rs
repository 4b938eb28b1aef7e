//! Remediation model and field mapping for the IDX login flow.
//!
//! - [`model`]: the server-described steps, forms and authenticators.
//! - [`client`]: the abstract IDX client the flow drives.
//! - [`fields`]: UI-agnostic descriptors handed to a rendering layer.
//! - [`mapper`]: step-to-descriptor mapping.

pub mod client;
pub mod fields;
pub mod mapper;
pub mod model;

pub use client::{IdxClient, IdxClientConfig, IdxClientError, IdxClientFactory, IdxClientResult};
pub use fields::{
    find_by_handle_mut, validate_all, ActionField, ActionTarget, DescriptorError, FieldDescriptor,
    FieldHandle, FieldPath, ImageField, OptionGroup, OptionItem, PathSegment, TextField,
    REQUIRED_FIELD_MESSAGE,
};
pub use mapper::{action_label, RemediationMapper, DEFAULT_TOTP_LABEL};
pub use model::{
    Authenticator, AuthenticatorCapability, AuthenticatorKind, Form, FormField, Message,
    MessageSeverity, RemediationStep, Response, StepCapability, StepType, TokenBundle,
    TotpCapability,
};
