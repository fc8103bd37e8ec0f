use thiserror::Error;

/// Failure to obtain one quantity from an upstream source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("field '{0}' missing from response")]
    MissingField(String),
}

/// Arithmetic that has no meaningful result.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ComputationError {
    #[error("division by zero: {0} is zero")]
    ZeroDenominator(&'static str),

    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Malformed(e.to_string())
    }
}
