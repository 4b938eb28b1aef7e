//! # Observability
//!
//! Logging setup for the IDX login workspace.
//!
//! Library crates only emit `tracing` events. Binaries call
//! [`init_with_config`] once at startup to decide where those events go:
//!
//! - a compact human-readable stream on stderr, and/or
//! - a JSONL file (one structured entry per line) with credential fields
//!   redacted before they reach disk.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "idx-login".into(),
//!         default_level: "debug".into(),
//!         log_path: Some("/tmp/idx.jsonl".into()),
//!         also_stderr: true,
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;
mod redact;

use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file::{CentralLogWriter, WriterFactory};
pub use json_layer::{JsonLayer, LogEntry};
pub use redact::{is_sensitive_key, sanitize_value, REDACTED};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "idx-login").
    /// Included in every JSONL line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// JSONL output file. No file layer is installed when unset.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// A second call in the same process is ignored (the global subscriber is
/// already set). If the log file cannot be opened, file output is skipped
/// and a warning is emitted on the remaining layers.
pub fn init_with_config(config: LogConfig) {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let mut file_error = None;
    let json_layer = match config.log_path.as_ref() {
        Some(path) => match CentralLogWriter::new(path) {
            Ok(writer) => Some(
                JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
                    .with_filter(env_filter()),
            ),
            Err(e) => {
                file_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        },
        None => None,
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    if let Some(error) = file_error {
        tracing::warn!(error = %error, "log file unavailable, file output disabled");
    }

    tracing::debug!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "observability initialized"
    );
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
