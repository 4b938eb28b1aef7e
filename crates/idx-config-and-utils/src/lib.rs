//! Configuration, paths, errors and logging setup shared by the IDX login crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CLIENT_ID, DEFAULT_ISSUER, DEFAULT_LOG_LEVEL, DEFAULT_REDIRECT_URI,
    DEFAULT_SCOPES,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
