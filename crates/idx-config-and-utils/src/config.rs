//! Configuration management for the IDX login tools.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default issuer (can be overridden at compile time via IDX_ISSUER env var).
pub const DEFAULT_ISSUER: &str = match option_env!("IDX_ISSUER") {
    Some(issuer) => issuer,
    None => "https://example.okta.com/oauth2/default",
};

/// Default OAuth client id (can be overridden at compile time via IDX_CLIENT_ID env var).
pub const DEFAULT_CLIENT_ID: &str = match option_env!("IDX_CLIENT_ID") {
    Some(client_id) => client_id,
    None => "idx-sample-client",
};

/// Default redirect URI (can be overridden at compile time via IDX_REDIRECT_URI env var).
pub const DEFAULT_REDIRECT_URI: &str = match option_env!("IDX_REDIRECT_URI") {
    Some(uri) => uri,
    None => "com.example.idx:/callback",
};

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [&str; 4] = ["openid", "email", "profile", "offline_access"];

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_LOG_LEVEL: &str = "IDX_SAMPLE_LOG_LEVEL";
const ENV_ISSUER: &str = "IDX_SAMPLE_ISSUER";
const ENV_CLIENT_ID: &str = "IDX_SAMPLE_CLIENT_ID";
const ENV_REDIRECT_URI: &str = "IDX_SAMPLE_REDIRECT_URI";

/// Login configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Authorization server issuer URL.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// OAuth client id registered with the issuer.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Redirect URI registered for the client.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Requested scopes.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            issuer: default_issuer(),
            client_id: default_client_id(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production). Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(issuer) = non_empty(ENV_ISSUER) {
            self.issuer = issuer;
        }
        if let Some(client_id) = non_empty(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(redirect_uri) = non_empty(ENV_REDIRECT_URI) {
            self.redirect_uri = redirect_uri;
        }
    }

    /// Get the issuer as a parsed URL, without a trailing slash in its path.
    pub fn issuer_url(&self) -> CoreResult<Url> {
        let url = Url::parse(self.issuer.trim_end_matches('/'))?;
        if url.cannot_be_a_base() {
            return Err(CoreError::InvalidIssuer {
                issuer: self.issuer.clone(),
                reason: "must be an absolute URL",
            });
        }
        Ok(url)
    }

    /// Check that the configuration can start a login flow.
    pub fn validate(&self) -> CoreResult<()> {
        let issuer = self.issuer_url()?;
        if !matches!(issuer.scheme(), "http" | "https") {
            return Err(CoreError::InvalidIssuer {
                issuer: self.issuer.clone(),
                reason: "scheme must be http or https",
            });
        }
        if self.client_id.trim().is_empty() {
            return Err(CoreError::MissingSetting("client_id"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(CoreError::MissingSetting("redirect_uri"));
        }
        if self.scopes.is_empty() {
            return Err(CoreError::MissingSetting("scopes"));
        }
        Ok(())
    }
}
