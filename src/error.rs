use std::path::PathBuf;
use thiserror::Error;

/// Failures inside the HTTP gateway before they are folded into an envelope.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("gateway URL '{0}' cannot carry a path")]
    OpaqueUrl(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Failures surfaced by the login and registration flows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A required form field was missing or inconsistent; no request was sent.
    #[error("{0}")]
    Invalid(String),
    /// The gateway refused the request.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
