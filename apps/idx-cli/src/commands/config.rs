//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use idx_config_and_utils::{Config, Paths};
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct ConfigView<'a> {
    #[serde(flatten)]
    config: &'a Config,
}

impl fmt::Display for ConfigView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", output::row("Issuer", &self.config.issuer))?;
        writeln!(f, "{}", output::row("Client ID", &self.config.client_id))?;
        writeln!(f, "{}", output::row("Redirect URI", &self.config.redirect_uri))?;
        writeln!(f, "{}", output::row("Scopes", &self.config.scopes.join(" ")))?;
        write!(f, "{}", output::row("Log level", &self.config.log_level))
    }
}

/// Show the effective configuration.
pub fn config_show(config: &Config, format: &OutputFormat) -> Result<()> {
    if let Err(e) = config.validate() {
        output::print_error(&e.to_string(), format);
    }
    output::print(&ConfigView { config }, format);
    Ok(())
}

/// Print the configuration file path.
pub fn config_path(paths: &Paths, format: &OutputFormat) -> Result<()> {
    let path = paths.config_file();
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "path": path, "exists": path.exists() })
        ),
    }
    Ok(())
}
