//! Logging initialization.
//!
//! Thin wrapper over the observability crate: every binary in the workspace
//! logs through `tracing`, with an optional JSONL file under
//! `~/.idx-sample/logs/` and optional human-readable output on stderr.

use std::path::PathBuf;

/// Initialize logging for `service_name`.
///
/// * `level` - default filter when `RUST_LOG` is unset
/// * `log_path` - JSONL file to append to
/// * `also_stderr` - mirror logs to stderr in compact form
pub fn init_logging(service_name: &str, level: &str, log_path: Option<PathBuf>, also_stderr: bool) {
    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path,
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
