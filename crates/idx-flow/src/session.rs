//! Post-login session: user claims and logout via token revocation.
//!
//! Token and claims state sit behind `parking_lot` locks so a spawned claims
//! fetch and the logout routine can share one manager through an `Arc`.
//! Locks are never held across an await.

use crate::controller::LoggedInUser;
use crate::error::{FlowError, FlowResult};
use crate::flow_fsm::{LogoutMachine, LogoutMachineInput, LogoutState};
use idx_remediation::IdxClientConfig;
use parking_lot::{Mutex, RwLock};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// User claims as display text, keyed by claim name.
pub type Claims = BTreeMap<String, String>;

const USERINFO_PATH: &str = "v1/userinfo";
const REVOKE_PATH: &str = "v1/revoke";

/// Which token a revocation request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTypeHint::AccessToken => "access_token",
            TokenTypeHint::RefreshToken => "refresh_token",
        }
    }
}

/// Claims and logout for one logged-in user.
pub struct SessionManager {
    config: IdxClientConfig,
    http_client: Client,
    user: RwLock<Option<LoggedInUser>>,
    claims: RwLock<Claims>,
    logout_fsm: Mutex<LogoutMachine>,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(config: &IdxClientConfig, user: LoggedInUser) -> Self {
        Self::with_http_client(config, user, Client::new())
    }

    /// Create a new session manager with a preconfigured HTTP client.
    pub fn with_http_client(config: &IdxClientConfig, user: LoggedInUser, http_client: Client) -> Self {
        Self {
            config: config.clone(),
            http_client,
            user: RwLock::new(Some(user)),
            claims: RwLock::new(Claims::new()),
            logout_fsm: Mutex::new(LogoutMachine::new()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.read().is_some()
    }

    pub fn user(&self) -> Option<LoggedInUser> {
        self.user.read().clone()
    }

    /// Last published claims; empty until a fetch succeeds.
    pub fn claims(&self) -> Claims {
        self.claims.read().clone()
    }

    /// Get the current logout state.
    pub fn logout_state(&self) -> LogoutState {
        LogoutState::from(self.logout_fsm.lock().state())
    }

    /// Fetch claims from the userinfo endpoint and publish them.
    ///
    /// Failures are logged and leave the published claims unchanged.
    pub async fn fetch_claims(&self) -> Claims {
        let access_token = self
            .user
            .read()
            .as_ref()
            .map(|user| user.tokens.access_token.clone());
        let Some(access_token) = access_token else {
            warn!("Claims requested without a logged-in user");
            return self.claims();
        };

        match self.request_claims(&access_token).await {
            Ok(Some(claims)) => {
                // Lock order: claims, then user. Logout clears both under the
                // same order, so a late fetch cannot republish.
                let mut published = self.claims.write();
                let same_user = self
                    .user
                    .read()
                    .as_ref()
                    .is_some_and(|user| user.tokens.access_token == access_token);
                if !same_user {
                    debug!("Session ended during claims fetch; discarding");
                    return published.clone();
                }
                debug!(count = claims.len(), "Claims fetched");
                *published = claims.clone();
                claims
            }
            Ok(None) => self.claims(),
            Err(e) => {
                warn!(error = %e, "Claims fetch failed");
                self.claims()
            }
        }
    }

    /// Run [`SessionManager::fetch_claims`] on a tokio task.
    pub fn spawn_claims_fetch(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.fetch_claims().await;
        })
    }

    async fn request_claims(&self, access_token: &str) -> FlowResult<Option<Claims>> {
        let url = self.config.endpoint(USERINFO_PATH);
        debug!(url = %url, "Fetching user claims");

        let response = self
            .http_client
            .get(&url)
            .header("authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Userinfo request rejected");
            return Ok(None);
        }

        let body: Value = response.json().await?;
        match body {
            Value::Object(map) => Ok(Some(
                map.into_iter()
                    .map(|(key, value)| (key, claim_text(&value)))
                    .collect(),
            )),
            other => {
                warn!(kind = %json_kind(&other), "Userinfo body is not an object");
                Ok(None)
            }
        }
    }

    /// Revoke the session's token and forget the user.
    ///
    /// The refresh token is revoked when present (which also invalidates its
    /// access tokens), otherwise the access token. On failure the user stays
    /// logged in and the logout state is `Failed`.
    pub async fn logout(&self) -> FlowResult<()> {
        self.transition(&LogoutMachineInput::LogoutRequested)?;

        let target = self.user.read().as_ref().map(|user| {
            match user.tokens.refresh_token.as_ref() {
                Some(refresh) => (refresh.clone(), TokenTypeHint::RefreshToken),
                None => (user.tokens.access_token.clone(), TokenTypeHint::AccessToken),
            }
        });
        let Some((token, hint)) = target else {
            self.transition(&LogoutMachineInput::RevokeFailed)?;
            return Err(FlowError::Unknown("Not logged in".to_string()));
        };

        match self.revoke(&token, hint).await {
            Ok(()) => {
                {
                    let mut claims = self.claims.write();
                    *self.user.write() = None;
                    claims.clear();
                }
                self.transition(&LogoutMachineInput::Revoked)?;
                info!(token_type_hint = hint.as_str(), "Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token revocation failed");
                self.transition(&LogoutMachineInput::RevokeFailed)?;
                Err(e)
            }
        }
    }

    /// Return to `Idle` after a successful logout has been shown.
    pub fn acknowledge_logout(&self) -> FlowResult<()> {
        self.transition(&LogoutMachineInput::Acknowledged).map(|_| ())
    }

    async fn revoke(&self, token: &str, hint: TokenTypeHint) -> FlowResult<()> {
        let url = self.config.endpoint(REVOKE_PATH);
        debug!(url = %url, token_type_hint = hint.as_str(), "Revoking token");

        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("token_type_hint", hint.as_str()),
                ("token", token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Revocation rejected");
            return Err(FlowError::RevokeRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn transition(&self, input: &LogoutMachineInput) -> FlowResult<LogoutState> {
        let mut fsm = self.logout_fsm.lock();
        let old_state = LogoutState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            FlowError::InvalidStateTransition(format!(
                "Cannot apply {:?} in logout state {:?}",
                input, old_state
            ))
        })?;

        let new_state = LogoutState::from(fsm.state());
        debug!(
            old_state = ?old_state,
            new_state = ?new_state,
            "Logout state transition"
        );
        Ok(new_state)
    }
}

/// Claim value as display text: strings as-is, scalars printed, `null` as
/// `"null"`, containers as the empty string.
pub fn claim_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
