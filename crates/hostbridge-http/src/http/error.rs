//! HTTP error type.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpErrorKind {
    EmptyUrl,
    InvalidUrl,
    UnsupportedMethod,
    /// A header line whose name or value is not valid on the wire.
    InvalidHeader,
    ConnectionFailed,
    Timeout,
    /// The body grew past `maxResponseBytes`.
    ResponseTooLarge,
    /// Redirect loops, broken bodies and other transport failures.
    RequestFailed,
    ClientBuild,
}

impl HttpErrorKind {
    /// Stable code reported across the FFI boundary.
    pub fn code(self) -> i32 {
        match self {
            Self::EmptyUrl => -40,
            Self::InvalidUrl => -41,
            Self::UnsupportedMethod => -42,
            Self::InvalidHeader => -43,
            Self::ConnectionFailed => -44,
            Self::Timeout => -45,
            Self::ResponseTooLarge => -46,
            Self::RequestFailed => -47,
            Self::ClientBuild => -48,
        }
    }
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn empty_url() -> Self {
        Self::new(HttpErrorKind::EmptyUrl, "URL is empty")
    }

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::InvalidUrl, msg)
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(HttpErrorKind::UnsupportedMethod, format!("unsupported method '{method}'"))
    }

    pub fn invalid_header(line: &str, reason: impl fmt::Display) -> Self {
        Self::new(HttpErrorKind::InvalidHeader, format!("header '{line}': {reason}"))
    }

    pub fn too_large(limit: u64) -> Self {
        Self::new(HttpErrorKind::ResponseTooLarge, format!("response body exceeds {limit} bytes"))
    }

    pub fn client_build(msg: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::ClientBuild, msg)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::new(HttpErrorKind::Timeout, format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::new(HttpErrorKind::ConnectionFailed, format!("connection failed: {e}"))
        } else if e.is_builder() {
            Self::invalid_url(e.to_string())
        } else {
            Self::new(HttpErrorKind::RequestFailed, format!("HTTP error: {e}"))
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
