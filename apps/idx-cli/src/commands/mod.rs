//! CLI command implementations.

mod check_login;
mod config;
mod fields;
mod session;

pub use check_login::check_login;
pub use config::{config_path, config_show};
pub use fields::fields;
pub use session::{claims, logout};
