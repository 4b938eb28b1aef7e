//! IDX login CLI - configuration, offline step mapping, claims and logout.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use idx_config_and_utils::{init_logging, Config, Paths};
use std::path::PathBuf;
use tracing::debug;

/// IDX login CLI - inspect and exercise the interaction-code login core.
#[derive(Parser)]
#[command(name = "idx-login")]
#[command(about = "IDX login tools: config, field mapping, claims and token revocation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Map a recorded IDX response into field descriptors
    Fields {
        /// Path to a response JSON file
        response: PathBuf,
        /// Remediation index to map
        #[arg(short, long, default_value = "0")]
        step: usize,
        /// Append the skip action when the response offers one
        #[arg(long)]
        include_skip: bool,
    },

    /// Fetch user claims with an access token
    Claims {
        /// Access token
        #[arg(long, env = "IDX_ACCESS_TOKEN")]
        access_token: String,
    },

    /// Revoke tokens
    Logout {
        /// Access token
        #[arg(long, env = "IDX_ACCESS_TOKEN")]
        access_token: String,
        /// Refresh token; revoked instead of the access token when given
        #[arg(long, env = "IDX_REFRESH_TOKEN")]
        refresh_token: Option<String>,
    },

    /// Validate login form input
    CheckLogin {
        /// Username or email address
        #[arg(short, long)]
        username: String,
        /// Password; prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            std::process::exit(1);
        }
    };
    let config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load config: {}", e), &cli.format);
            std::process::exit(1);
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    // Command output owns stdout/stderr; logs go to the JSONL file only.
    let log_path = paths.ensure_dirs().ok().map(|_| paths.log_file());
    init_logging("idx-login", level, log_path, false);
    debug!(config_file = %paths.config_file().display(), "Configuration loaded");

    let result = match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&config, &cli.format),
            ConfigCommands::Path => commands::config_path(&paths, &cli.format),
        },
        Commands::Fields {
            response,
            step,
            include_skip,
        } => commands::fields(&response, step, include_skip, &cli.format),
        Commands::Claims { access_token } => {
            commands::claims(&config, &access_token, &cli.format).await
        }
        Commands::Logout {
            access_token,
            refresh_token,
        } => commands::logout(&config, access_token, refresh_token, &cli.format).await,
        Commands::CheckLogin { username, password } => {
            commands::check_login(&username, password, &cli.format)
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}
