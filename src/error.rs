//! Errors raised by the bridge itself, as opposed to the transfer and SQL
//! crates it drives.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid bridge configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("argument '{0}' is null")]
    NullArgument(&'static str),

    #[error("argument '{0}' is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("argument '{0}' contains an interior NUL byte")]
    InteriorNul(&'static str),

    #[error("invalid base64 content: {0}")]
    InvalidBase64(String),

    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[source] hostbridge_http::HttpError),
}

impl BridgeError {
    /// Host-facing code, below the range used by transfer errors.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) => -100,
            Self::Runtime(_) => -101,
            Self::NullArgument(_) => -102,
            Self::InvalidUtf8(_) => -103,
            Self::InteriorNul(_) => -104,
            Self::InvalidBase64(_) => -105,
            Self::HttpClient(_) => -106,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
