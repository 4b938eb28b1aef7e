//! Credential validation for the login form, before any flow starts.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

/// Shortest accepted password, exclusive.
const MIN_PASSWORD_LEN: usize = 5;

/// Android's `Patterns.EMAIL_ADDRESS`, anchored for a full match.
static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z0-9+._%-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9-]{0,64}(?:\.[a-zA-Z0-9][a-zA-Z0-9-]{0,25})+)$",
    )
    .expect("email pattern compiles")
});

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFieldError {
    #[error("Not a valid username")]
    InvalidUsername,
    #[error("Password must be >5 characters")]
    InvalidPassword,
}

impl LoginFieldError {
    pub fn message(&self) -> &'static str {
        match self {
            LoginFieldError::InvalidUsername => "Not a valid username",
            LoginFieldError::InvalidPassword => "Password must be >5 characters",
        }
    }
}

/// Validation state of the username/password form.
///
/// Only the first failing field is reported, username before password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginFormState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_error: Option<LoginFieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_error: Option<LoginFieldError>,
    pub is_data_valid: bool,
}

impl LoginFormState {
    pub fn validate(username: &str, password: &str) -> Self {
        if !is_username_valid(username) {
            Self {
                username_error: Some(LoginFieldError::InvalidUsername),
                ..Self::default()
            }
        } else if !is_password_valid(password) {
            Self {
                password_error: Some(LoginFieldError::InvalidPassword),
                ..Self::default()
            }
        } else {
            Self {
                is_data_valid: true,
                ..Self::default()
            }
        }
    }
}

/// A username containing `@` must be an email address; anything else just
/// has to be non-blank.
pub fn is_username_valid(username: &str) -> bool {
    if username.contains('@') {
        is_email_address(username)
    } else {
        !username.trim().is_empty()
    }
}

pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() > MIN_PASSWORD_LEN
}

fn is_email_address(value: &str) -> bool {
    EMAIL_ADDRESS.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credentials() {
        let state = LoginFormState::validate("alice@example.com", "secret1");
        assert!(state.is_data_valid);
        assert!(state.username_error.is_none());
        assert!(state.password_error.is_none());

        assert!(LoginFormState::validate("alice", "secret1").is_data_valid);
    }

    #[test]
    fn test_username_rules() {
        assert!(!is_username_valid(""));
        assert!(!is_username_valid("   "));
        assert!(is_username_valid("alice"));
        assert!(is_username_valid("a.b@c.io"));
        assert!(!is_username_valid("alice@"));
        assert!(!is_username_valid("@example.com"));
        assert!(!is_username_valid("alice@localhost"));
        assert!(!is_username_valid("alice@@example.com"));
        assert!(!is_username_valid("al ice@example.com"));
        assert!(!is_username_valid("alice@exa..mple.com"));
    }

    #[test]
    fn test_email_usernames_follow_android_pattern() {
        assert!(!is_username_valid("a!b@example.com"));
        assert!(!is_username_valid("al#ice@example.com"));
        assert!(!is_username_valid("josé@example.com"));
        assert!(is_username_valid("alice@exa-.com"));
        assert!(is_username_valid("alice@example.c-"));
        assert!(is_username_valid("first.last+tag%x@sub.example.co"));
        assert!(!is_username_valid("alice@example.com "));
    }

    #[test]
    fn test_password_must_exceed_five_chars() {
        assert!(!is_password_valid("12345"));
        assert!(is_password_valid("123456"));
        // Counted in characters, not bytes.
        assert!(!is_password_valid("ééééé"));
    }

    #[test]
    fn test_username_error_reported_first() {
        let state = LoginFormState::validate("", "123");
        assert_eq!(state.username_error, Some(LoginFieldError::InvalidUsername));
        assert!(state.password_error.is_none());
        assert!(!state.is_data_valid);

        let state = LoginFormState::validate("alice", "123");
        assert_eq!(state.password_error, Some(LoginFieldError::InvalidPassword));
        assert_eq!(
            state.password_error.map(|e| e.message()),
            Some("Password must be >5 characters")
        );
        assert_eq!(
            LoginFieldError::InvalidUsername.to_string(),
            LoginFieldError::InvalidUsername.message()
        );
    }
}
