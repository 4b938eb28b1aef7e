//! Client configuration from the workspace `Config`.

use crate::error::{FlowError, FlowResult};
use idx_config_and_utils::Config;
use idx_remediation::IdxClientConfig;

/// Build the IDX client configuration, rejecting incomplete settings.
pub fn client_config(config: &Config) -> FlowResult<IdxClientConfig> {
    config
        .validate()
        .map_err(|e| FlowError::Config(e.to_string()))?;
    let issuer = config
        .issuer_url()
        .map_err(|e| FlowError::Config(e.to_string()))?;

    Ok(IdxClientConfig {
        issuer,
        client_id: config.client_id.clone(),
        scopes: config.scopes.clone(),
        redirect_uri: config.redirect_uri.clone(),
    })
}
