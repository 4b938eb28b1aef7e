//! Login flow error types.

use idx_remediation::{AuthenticatorKind, DescriptorError, IdxClientError, StepType};
use serde::Serialize;
use thiserror::Error;

/// Localizable error codes for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ClientErrorCreate,
    ClientErrorResume,
    ClientErrorProceed,
    ClientErrorExchange,
    ClientErrorRemediation,
    ClientErrorAuthenticator,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ClientErrorCreate => "client_error_create",
            ErrorCode::ClientErrorResume => "client_error_resume",
            ErrorCode::ClientErrorProceed => "client_error_proceed",
            ErrorCode::ClientErrorExchange => "client_error_exchange",
            ErrorCode::ClientErrorRemediation => "client_error_remediation",
            ErrorCode::ClientErrorAuthenticator => "client_error_authenticator",
            ErrorCode::UnknownError => "unknown_error",
        }
    }

    /// English fallback text.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ClientErrorCreate => "Could not start the sign-in flow.",
            ErrorCode::ClientErrorResume => "Could not resume the sign-in flow.",
            ErrorCode::ClientErrorProceed => "Could not submit this step.",
            ErrorCode::ClientErrorExchange => "Could not obtain tokens.",
            ErrorCode::ClientErrorRemediation => "This sign-in step is not supported.",
            ErrorCode::ClientErrorAuthenticator => "This authenticator is not supported.",
            ErrorCode::UnknownError => "Something went wrong.",
        }
    }
}

/// Login flow error type.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Client could not be started
    #[error("Client creation failed: {0}")]
    ClientCreation(#[source] IdxClientError),

    /// Resume call failed
    #[error("Resume failed: {0}")]
    Resume(#[source] IdxClientError),

    /// Proceed call failed
    #[error("Proceed failed: {0}")]
    Proceed(#[source] IdxClientError),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    Exchange(#[source] IdxClientError),

    /// Response carried no remediation steps
    #[error("No remediation offered")]
    NoRemediation,

    /// First step is of a type the flow cannot handle
    #[error("Unsupported remediation: {0}")]
    UnsupportedRemediation(StepType),

    /// Challenge without an authenticator, or one of an unsupported kind
    #[error("Unsupported authenticator: {0:?}")]
    UnsupportedAuthenticator(Option<AuthenticatorKind>),

    /// Message supplied by the server, shown verbatim
    #[error("{0}")]
    ServerMessage(String),

    /// Anything else
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// Operation not allowed in the current flow state
    #[error("Invalid flow state transition: {0}")]
    InvalidStateTransition(String),

    /// A field edit did not resolve against the pending step
    #[error("Field update failed: {0}")]
    Field(#[from] DescriptorError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Revocation endpoint answered with a non-success status
    #[error("Token revocation rejected: HTTP {status}")]
    RevokeRejected { status: u16 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    /// Returns true if the flow cannot continue and must be restarted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FlowError::NoRemediation
                | FlowError::UnsupportedRemediation(_)
                | FlowError::UnsupportedAuthenticator(_)
        )
    }

    /// Localizable code. `None` for server messages, which are shown as-is.
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            FlowError::ClientCreation(_) => ErrorCode::ClientErrorCreate,
            FlowError::Resume(_) => ErrorCode::ClientErrorResume,
            FlowError::Proceed(_) => ErrorCode::ClientErrorProceed,
            FlowError::Exchange(_) => ErrorCode::ClientErrorExchange,
            FlowError::NoRemediation | FlowError::UnsupportedRemediation(_) => {
                ErrorCode::ClientErrorRemediation
            }
            FlowError::UnsupportedAuthenticator(_) => ErrorCode::ClientErrorAuthenticator,
            FlowError::ServerMessage(_) => return None,
            FlowError::Unknown(_)
            | FlowError::InvalidStateTransition(_)
            | FlowError::Field(_)
            | FlowError::Http(_)
            | FlowError::RevokeRejected { .. }
            | FlowError::Config(_) => ErrorCode::UnknownError,
        };
        Some(code)
    }

    /// Text for the rendering layer: the server message verbatim, otherwise
    /// the code's fallback text.
    pub fn display_message(&self) -> String {
        match (self, self.code()) {
            (FlowError::ServerMessage(message), _) => message.clone(),
            (_, Some(code)) => code.default_message().to_string(),
            (_, None) => self.to_string(),
        }
    }
}

/// Result type alias using FlowError.
pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(FlowError::NoRemediation.is_fatal());
        assert!(FlowError::UnsupportedRemediation(StepType::RedirectIdp).is_fatal());
        assert!(FlowError::UnsupportedAuthenticator(None).is_fatal());
        assert!(!FlowError::ServerMessage("Invalid code".to_string()).is_fatal());
        assert!(!FlowError::Proceed(IdxClientError::Network("down".to_string())).is_fatal());
    }

    #[test]
    fn test_codes() {
        let network = || IdxClientError::Network("down".to_string());
        assert_eq!(
            FlowError::ClientCreation(network()).code(),
            Some(ErrorCode::ClientErrorCreate)
        );
        assert_eq!(FlowError::Resume(network()).code(), Some(ErrorCode::ClientErrorResume));
        assert_eq!(FlowError::Proceed(network()).code(), Some(ErrorCode::ClientErrorProceed));
        assert_eq!(FlowError::Exchange(network()).code(), Some(ErrorCode::ClientErrorExchange));
        assert_eq!(FlowError::NoRemediation.code(), Some(ErrorCode::ClientErrorRemediation));
        assert_eq!(
            FlowError::UnsupportedAuthenticator(Some(AuthenticatorKind::Phone)).code(),
            Some(ErrorCode::ClientErrorAuthenticator)
        );
        assert_eq!(FlowError::Unknown("x".to_string()).code(), Some(ErrorCode::UnknownError));
        assert_eq!(FlowError::ServerMessage("x".to_string()).code(), None);
    }

    #[test]
    fn test_server_message_is_displayed_verbatim() {
        let err = FlowError::ServerMessage("Invalid code".to_string());
        assert_eq!(err.to_string(), "Invalid code");
        assert_eq!(err.display_message(), "Invalid code");
        assert_eq!(
            FlowError::NoRemediation.display_message(),
            ErrorCode::ClientErrorRemediation.default_message()
        );
    }

    #[test]
    fn test_error_code_serializes_snake_case() {
        let json = serde_json::to_value(ErrorCode::ClientErrorAuthenticator).unwrap();
        assert_eq!(json, "client_error_authenticator");
        assert_eq!(ErrorCode::UnknownError.as_str(), "unknown_error");
    }
}
