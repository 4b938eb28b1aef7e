//! Login form validation command.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use idx_flow::LoginFormState;
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct LoginCheck {
    #[serde(flatten)]
    state: LoginFormState,
}

impl fmt::Display for LoginCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.state.is_data_valid {
            return write!(f, "Credentials look valid");
        }
        let errors: Vec<&str> = [self.state.username_error, self.state.password_error]
            .iter()
            .flatten()
            .map(|e| e.message())
            .collect();
        write!(f, "{}", errors.join("\n"))
    }
}

/// Validate a username and password the way the login form does.
pub fn check_login(username: &str, password: Option<String>, format: &OutputFormat) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    let state = LoginFormState::validate(username, &password);
    let valid = state.is_data_valid;
    output::print(&LoginCheck { state }, format);

    if !valid {
        anyhow::bail!("Login form input is invalid");
    }
    Ok(())
}
