//! Claims and logout commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use idx_config_and_utils::Config;
use idx_flow::{client_config, Claims, LoggedInUser, SessionManager};
use idx_remediation::TokenBundle;
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct ClaimsView {
    claims: Claims,
}

impl fmt::Display for ClaimsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.claims.is_empty() {
            return write!(f, "No claims returned");
        }
        let rows: Vec<String> = self
            .claims
            .iter()
            .map(|(key, value)| output::row(key, value))
            .collect();
        write!(f, "{}", rows.join("\n"))
    }
}

fn session(config: &Config, access_token: String, refresh_token: Option<String>) -> Result<SessionManager> {
    let client_config = client_config(config)?;
    let user = LoggedInUser {
        tokens: TokenBundle {
            token_type: "Bearer".to_string(),
            expires_in: 0,
            access_token,
            scope: None,
            refresh_token,
            id_token: None,
        },
    };
    Ok(SessionManager::new(&client_config, user))
}

/// Fetch and print user claims.
pub async fn claims(config: &Config, access_token: &str, format: &OutputFormat) -> Result<()> {
    let session = session(config, access_token.to_string(), None)?;
    let claims = session.fetch_claims().await;
    output::print(&ClaimsView { claims }, format);
    Ok(())
}

/// Revoke the refresh token if given, otherwise the access token.
pub async fn logout(
    config: &Config,
    access_token: String,
    refresh_token: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let session = session(config, access_token, refresh_token)?;
    session.logout().await?;
    output::print_success("Logged out successfully", format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_view_text() {
        let mut claims = Claims::new();
        claims.insert("email".to_string(), "alice@example.com".to_string());
        claims.insert("sub".to_string(), "00u1".to_string());

        let text = ClaimsView { claims }.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("email:"));
        assert!(lines[0].ends_with("alice@example.com"));

        assert_eq!(
            ClaimsView { claims: Claims::new() }.to_string(),
            "No claims returned"
        );
    }

    #[test]
    fn test_session_rejects_invalid_config() {
        let config = Config {
            issuer: "not a url".to_string(),
            ..Config::default()
        };
        assert!(session(&config, "a1".to_string(), None).is_err());
    }
}
