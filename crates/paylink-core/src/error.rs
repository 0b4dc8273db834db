//! Error types for Paylink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Request errors
    #[error("Requested plan not configured on server")]
    PlanNotConfigured,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Provider errors
    #[error("{0}")]
    Provider(String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    // Startup errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the caller is at fault (as opposed to the provider or server).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::PlanNotConfigured | Error::InvalidRequest(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidRequest(err.to_string())
    }
}
