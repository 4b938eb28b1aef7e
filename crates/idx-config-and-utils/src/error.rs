//! Errors from loading and checking the IDX login configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The issuer parsed but cannot anchor the IDX endpoints.
    #[error("Invalid issuer {issuer}: {reason}")]
    InvalidIssuer { issuer: String, reason: &'static str },

    /// A setting the login flow needs is blank.
    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("Issuer is not a URL: {0}")]
    IssuerParse(#[from] url::ParseError),

    /// Config file could not be read or its directories created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_setting() {
        let err = CoreError::InvalidIssuer {
            issuer: "ftp://login.example.com".to_string(),
            reason: "scheme must be http or https",
        };
        assert_eq!(
            err.to_string(),
            "Invalid issuer ftp://login.example.com: scheme must be http or https"
        );
        assert_eq!(
            CoreError::MissingSetting("client_id").to_string(),
            "Missing setting: client_id"
        );
    }
}
