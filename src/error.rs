//! Error types for the status check.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("unsupported signature algorithm '{0}' (expected SHA1 or SHA256)")]
    UnsupportedAlgorithm(String),

    #[error("failed to compute request signature: {0}")]
    Signing(String),

    #[error("AWS credentials error: {0}")]
    Credentials(String),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("malformed XML response: {0}")]
    Xml(String),
}

pub type Result<T> = std::result::Result<T, CheckError>;
